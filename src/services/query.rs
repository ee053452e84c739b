//! List-view query composition.
//!
//! Raw request parameters are turned into a [`MedicineQuery`]: a validated
//! filter, search, sort and page specification that any
//! [`MedicineStore`](super::store::MedicineStore) can execute. Unknown or
//! malformed parameters fall back to defaults and never produce an error.

use std::cmp::Ordering;

use chrono::{Datelike, Duration, Months, NaiveDate};
use phf::phf_map;
use url::form_urlencoded;

use crate::db::fold;
use crate::db::models::{near_expiry_horizon, AdministrationType, CountType, Medicine};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Raw list parameters as received from the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub q: Option<String>,
    pub filter: Option<String>,
    pub category: Option<String>,
    pub administration: Option<String>,
    pub count: Option<String>,
    pub expires: Option<String>,
    pub sort: Option<String>,
    pub dir: Option<String>,
    pub page: Option<String>,
}

impl ListParams {
    /// Parses `q=..&filter=..&sort=..&dir=..&page=..` plus the column
    /// selectors `category`, `administration`, `count` and `expires`. Unknown
    /// keys are ignored; for repeated keys the last value wins.
    pub fn from_query_string(input: &str) -> Self {
        let input = input.trim().trim_start_matches('?');
        let mut params = ListParams::default();
        for (key, value) in form_urlencoded::parse(input.as_bytes()) {
            let value = Some(value.into_owned());
            match key.as_ref() {
                "q" => params.q = value,
                "filter" => params.filter = value,
                "category" => params.category = value,
                "administration" => params.administration = value,
                "count" => params.count = value,
                "expires" => params.expires = value,
                "sort" => params.sort = value,
                "dir" => params.dir = value,
                "page" => params.page = value,
                other => log::debug!("Ignoring unknown list parameter `{}`", other),
            }
        }
        params
    }
}

/// Predefined, mutually exclusive list filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockFilter {
    NearExpiry,
    Expired,
    OutOfStock,
    LowStock,
}

static FILTERS: phf::Map<&'static str, StockFilter> = phf_map! {
    "near_expiry" => StockFilter::NearExpiry,
    "expired" => StockFilter::Expired,
    "out_of_stock" => StockFilter::OutOfStock,
    "low_stock" => StockFilter::LowStock,
};

impl StockFilter {
    /// Returns `None` for `none`, blanks and anything unrecognised.
    pub fn parse(value: &str) -> Option<Self> {
        FILTERS.get(value.trim()).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NearExpiry => "near_expiry",
            Self::Expired => "expired",
            Self::OutOfStock => "out_of_stock",
            Self::LowStock => "low_stock",
        }
    }

    pub fn matches(self, medicine: &Medicine, today: NaiveDate) -> bool {
        match self {
            Self::NearExpiry => {
                medicine.expiration_date >= today
                    && medicine.expiration_date <= near_expiry_horizon(today)
            }
            Self::Expired => medicine.expiration_date < today,
            Self::OutOfStock => medicine.quantity == 0,
            Self::LowStock => medicine.quantity <= medicine.low_stock_threshold,
        }
    }
}

/// Calendar windows over `expiration_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryWindow {
    Today,
    PastSevenDays,
    ThisMonth,
    ThisYear,
}

static EXPIRY_WINDOWS: phf::Map<&'static str, ExpiryWindow> = phf_map! {
    "today" => ExpiryWindow::Today,
    "past_7_days" => ExpiryWindow::PastSevenDays,
    "this_month" => ExpiryWindow::ThisMonth,
    "this_year" => ExpiryWindow::ThisYear,
};

impl ExpiryWindow {
    pub fn parse(value: &str) -> Option<Self> {
        EXPIRY_WINDOWS.get(value.trim()).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::PastSevenDays => "past_7_days",
            Self::ThisMonth => "this_month",
            Self::ThisYear => "this_year",
        }
    }

    /// Half-open `[start, end)` date range relative to `today`.
    pub fn bounds(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let tomorrow = today + Duration::days(1);
        match self {
            Self::Today => (today, tomorrow),
            Self::PastSevenDays => (today - Duration::days(7), tomorrow),
            Self::ThisMonth => {
                let start = today - Duration::days(i64::from(today.day0()));
                (start, start + Months::new(1))
            }
            Self::ThisYear => {
                let start = today - Duration::days(i64::from(today.ordinal0()));
                (start, start + Months::new(12))
            }
        }
    }

    pub fn contains(self, date: NaiveDate, today: NaiveDate) -> bool {
        let (start, end) = self.bounds(today);
        date >= start && date < end
    }
}

/// Sortable columns. Only these ever reach an `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Name,
    Category,
    Quantity,
    ExpirationDate,
}

static SORT_FIELDS: phf::Map<&'static str, SortField> = phf_map! {
    "name" => SortField::Name,
    "category" => SortField::Category,
    "quantity" => SortField::Quantity,
    "expiration_date" => SortField::ExpirationDate,
    "expirationDate" => SortField::ExpirationDate,
};

impl SortField {
    pub fn parse(value: &str) -> Option<Self> {
        SORT_FIELDS.get(value.trim()).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Category => "category",
            Self::Quantity => "quantity",
            Self::ExpirationDate => "expiration_date",
        }
    }

    /// Column name in the `medicines` table.
    pub fn column(self) -> &'static str {
        self.as_str()
    }

    fn compare(self, a: &Medicine, b: &Medicine) -> Ordering {
        match self {
            Self::Name => a.name.cmp(&b.name),
            Self::Category => a.category.cmp(&b.category),
            Self::Quantity => a.quantity.cmp(&b.quantity),
            Self::ExpirationDate => a.expiration_date.cmp(&b.expiration_date),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

static DIRECTIONS: phf::Map<&'static str, SortDirection> = phf_map! {
    "asc" => SortDirection::Asc,
    "desc" => SortDirection::Desc,
};

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        DIRECTIONS.get(value.trim().to_lowercase().as_str()).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// Validated list query: filter, column selectors and search narrow the
/// collection, the sort orders it, and `page` selects the slice to return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicineQuery {
    pub search: Option<String>,
    pub filter: Option<StockFilter>,
    /// Exact category.
    pub category: Option<String>,
    pub administration: Option<AdministrationType>,
    pub count_type: Option<CountType>,
    pub expires: Option<ExpiryWindow>,
    pub sort: SortField,
    pub direction: SortDirection,
    /// 1-indexed.
    pub page: u32,
    /// Reference day for the expiry filters.
    pub today: NaiveDate,
}

impl MedicineQuery {
    /// Unfiltered first page in default order.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            search: None,
            filter: None,
            category: None,
            administration: None,
            count_type: None,
            expires: None,
            sort: SortField::default(),
            direction: SortDirection::default(),
            page: 1,
            today,
        }
    }

    /// Builds a query from raw parameters, falling back to defaults for any
    /// value that is missing or not recognised.
    pub fn compose(params: &ListParams, today: NaiveDate) -> Self {
        let search = params
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);

        let filter = params.filter.as_deref().and_then(StockFilter::parse);

        let category = params
            .category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty())
            .map(str::to_string);
        let administration = params
            .administration
            .as_deref()
            .and_then(|raw| raw.parse::<AdministrationType>().ok());
        let count_type = params
            .count
            .as_deref()
            .and_then(|raw| raw.parse::<CountType>().ok());
        let expires = params.expires.as_deref().and_then(ExpiryWindow::parse);

        let sort = match params.sort.as_deref() {
            Some(raw) => SortField::parse(raw).unwrap_or_else(|| {
                log::warn!("Unsupported sort field `{}`, sorting by name", raw);
                SortField::default()
            }),
            None => SortField::default(),
        };

        let direction = params
            .dir
            .as_deref()
            .and_then(SortDirection::parse)
            .unwrap_or_default();

        let page = params.page.as_deref().map_or(1, parse_page);

        Self {
            search,
            filter,
            category,
            administration,
            count_type,
            expires,
            sort,
            direction,
            page,
            today,
        }
    }

    pub fn with_filter(mut self, filter: StockFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        let category = category.trim();
        self.category = (!category.is_empty()).then(|| category.to_string());
        self
    }

    pub fn with_administration(mut self, administration: AdministrationType) -> Self {
        self.administration = Some(administration);
        self
    }

    pub fn with_count_type(mut self, count_type: CountType) -> Self {
        self.count_type = Some(count_type);
        self
    }

    pub fn with_expiry_window(mut self, window: ExpiryWindow) -> Self {
        self.expires = Some(window);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        let search = search.into();
        let search = search.trim();
        self.search = (!search.is_empty()).then(|| search.to_string());
        self
    }

    pub fn sorted_by(mut self, sort: SortField, direction: SortDirection) -> Self {
        self.sort = sort;
        self.direction = direction;
        self
    }

    pub fn at_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Filter, selectors and search combined conjunctively.
    pub fn matches(&self, medicine: &Medicine) -> bool {
        let filtered = self
            .filter
            .map_or(true, |filter| filter.matches(medicine, self.today));
        filtered && self.matches_selectors(medicine) && self.matches_search(medicine)
    }

    fn matches_selectors(&self, medicine: &Medicine) -> bool {
        self.category
            .as_deref()
            .map_or(true, |category| medicine.category == category)
            && self
                .administration
                .map_or(true, |administration| medicine.administration_type == administration)
            && self
                .count_type
                .map_or(true, |count_type| medicine.count_type == count_type)
            && self
                .expires
                .map_or(true, |window| window.contains(medicine.expiration_date, self.today))
    }

    fn matches_search(&self, medicine: &Medicine) -> bool {
        let Some(search) = self.search.as_deref() else {
            return true;
        };
        let needle = fold(search);
        [&medicine.name, &medicine.composition, &medicine.category]
            .iter()
            .any(|field| fold(field).contains(&needle))
    }

    /// Requested sort, then `(name, composition, id)` ascending.
    pub fn compare(&self, a: &Medicine, b: &Medicine) -> Ordering {
        self.direction
            .apply(self.sort.compare(a, b))
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.composition.cmp(&b.composition))
            .then_with(|| a.id.cmp(&b.id))
    }

    /// Offset of the first record on the requested page.
    pub fn offset(&self, page_size: u32) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(page_size)
    }

    /// Effective parameters, without the page, as a form-urlencoded string.
    pub fn to_query_string(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        if let Some(search) = &self.search {
            serializer.append_pair("q", search);
        }
        if let Some(filter) = self.filter {
            serializer.append_pair("filter", filter.as_str());
        }
        if let Some(category) = &self.category {
            serializer.append_pair("category", category);
        }
        if let Some(administration) = self.administration {
            serializer.append_pair("administration", administration.code());
        }
        if let Some(count_type) = self.count_type {
            serializer.append_pair("count", count_type.code());
        }
        if let Some(window) = self.expires {
            serializer.append_pair("expires", window.as_str());
        }
        serializer
            .append_pair("sort", self.sort.as_str())
            .append_pair("dir", self.direction.as_str());
        serializer.finish()
    }

    /// Echo string for `page`, keeping every other active parameter.
    pub fn page_link(&self, page: u32) -> String {
        format!("{}&page={}", self.to_query_string(), page.max(1))
    }

    /// Query for a sort-toggle link: the active field flips direction, any
    /// other field starts ascending. Always returns to the first page.
    pub fn toggle_sort(&self, field: SortField) -> MedicineQuery {
        let direction = if field == self.sort {
            self.direction.reversed()
        } else {
            SortDirection::Asc
        };
        self.clone().sorted_by(field, direction).at_page(1)
    }

    pub fn sort_link(&self, field: SortField) -> String {
        self.toggle_sort(field).to_query_string()
    }
}

fn parse_page(raw: &str) -> u32 {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => 1,
        Ok(page) => u32::try_from(page).unwrap_or(u32::MAX),
    }
}

/// One page of list results plus what the caller needs to build follow-up
/// links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MedicinePage {
    pub items: Vec<Medicine>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub query: MedicineQuery,
}

impl MedicinePage {
    /// Always at least one, so an empty result still has a first page.
    pub fn num_pages(&self) -> u32 {
        let page_size = i64::from(self.page_size.max(1));
        let pages = (self.total + page_size - 1) / page_size;
        u32::try_from(pages.max(1)).unwrap_or(u32::MAX)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.num_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    /// Echo string of the effective parameters.
    pub fn echo(&self) -> String {
        self.query.to_query_string()
    }

    pub fn next_link(&self) -> Option<String> {
        self.has_next().then(|| self.query.page_link(self.page + 1))
    }

    pub fn previous_link(&self) -> Option<String> {
        self.has_previous()
            .then(|| self.query.page_link((self.page - 1).min(self.num_pages())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 10).unwrap()
    }

    fn medicine(id: i64, name: &str, composition: &str, category: &str) -> Medicine {
        let stamp = today().and_hms_opt(8, 30, 0).unwrap();
        Medicine {
            id,
            name: name.to_string(),
            composition: composition.to_string(),
            administration_type: AdministrationType::Oral,
            category: category.to_string(),
            count_type: CountType::Tablet,
            quantity: 50,
            low_stock_threshold: 10,
            expiration_date: today() + Duration::days(365),
            remarks: None,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    fn params(query: &str) -> MedicineQuery {
        MedicineQuery::compose(&ListParams::from_query_string(query), today())
    }

    #[test]
    fn empty_parameters_use_defaults() {
        let query = params("");
        assert_eq!(query, MedicineQuery::new(today()));
        assert_eq!(query.to_query_string(), "sort=name&dir=asc");
    }

    #[test]
    fn parses_every_parameter() {
        let query = params("?q=amox&filter=low_stock&sort=quantity&dir=desc&page=3");
        assert_eq!(query.search.as_deref(), Some("amox"));
        assert_eq!(query.filter, Some(StockFilter::LowStock));
        assert_eq!(query.sort, SortField::Quantity);
        assert_eq!(query.direction, SortDirection::Desc);
        assert_eq!(query.page, 3);
    }

    #[test]
    fn unknown_values_fall_back_to_defaults() {
        let query = params("sort=remarks&dir=sideways&filter=discontinued&page=abc");
        assert_eq!(query.sort, SortField::Name);
        assert_eq!(query.direction, SortDirection::Asc);
        assert_eq!(query.filter, None);
        assert_eq!(query.page, 1);

        assert_eq!(params("filter=none").filter, None);
        assert_eq!(params("page=0").page, 1);
        assert_eq!(params("page=-4").page, 1);
        assert_eq!(params("q=%20%20").search, None);
    }

    #[test]
    fn accepts_camel_case_expiration_alias() {
        assert_eq!(params("sort=expirationDate").sort, SortField::ExpirationDate);
        assert_eq!(params("dir=DESC").direction, SortDirection::Desc);
    }

    #[test]
    fn search_is_case_insensitive_across_fields() {
        let query = MedicineQuery::new(today()).with_search("PARA");
        assert!(query.matches(&medicine(1, "Paracetamol", "Paracetamol 500mg", "Analgesic")));
        assert!(query.matches(&medicine(2, "Ibuprofen", "Ibuprofen 200mg + Paracetamol 500mg", "Analgesic")));
        assert!(!query.matches(&medicine(3, "Amoxicillin", "Amoxicillin 250mg", "Antibiotic")));

        let by_category = MedicineQuery::new(today()).with_search("biot");
        assert!(by_category.matches(&medicine(3, "Amoxicillin", "Amoxicillin 250mg", "Antibiotic")));
    }

    #[test]
    fn near_expiry_filter_spans_today_to_day_ninety() {
        let filter = StockFilter::NearExpiry;
        let mut item = medicine(1, "Insulin", "Insulin glargine 100U/ml", "Antidiabetic");

        for (offset, expected) in [(-1, false), (0, true), (45, true), (90, true), (91, false)] {
            item.expiration_date = today() + Duration::days(offset);
            assert_eq!(filter.matches(&item, today()), expected, "offset {offset}");
        }
    }

    #[test]
    fn expired_filter_excludes_today() {
        let mut item = medicine(1, "Insulin", "Insulin glargine 100U/ml", "Antidiabetic");
        item.expiration_date = today();
        assert!(!StockFilter::Expired.matches(&item, today()));
        item.expiration_date = today() - Duration::days(1);
        assert!(StockFilter::Expired.matches(&item, today()));
    }

    #[test]
    fn low_stock_includes_threshold() {
        let mut item = medicine(1, "Salbutamol", "Salbutamol 100mcg", "Bronchodilator");
        item.low_stock_threshold = 5;
        item.quantity = 5;
        assert!(StockFilter::LowStock.matches(&item, today()));
        item.quantity = 6;
        assert!(!StockFilter::LowStock.matches(&item, today()));
    }

    #[test]
    fn search_folds_non_ascii_case() {
        let query = MedicineQuery::new(today()).with_search("ÁCIDO");
        assert!(query.matches(&medicine(1, "Ácido fólico", "Ácido fólico 5mg", "Vitamina")));
        assert!(!query.matches(&medicine(2, "Acido", "Acido 5mg", "Vitamina")));
    }

    #[test]
    fn column_selectors_narrow_conjunctively() {
        let query = params("category=Antibiotic&administration=injection&count=vial&q=cef");
        assert_eq!(query.category.as_deref(), Some("Antibiotic"));
        assert_eq!(query.administration, Some(AdministrationType::Injection));
        assert_eq!(query.count_type, Some(CountType::Vial));

        let mut vial = medicine(1, "Ceftriaxone", "Ceftriaxone 1g", "Antibiotic");
        vial.administration_type = AdministrationType::Injection;
        vial.count_type = CountType::Vial;
        assert!(query.matches(&vial));

        let oral = medicine(2, "Cefalexin", "Cefalexin 500mg", "Antibiotic");
        assert!(!query.matches(&oral));

        let mut other_category = vial.clone();
        other_category.category = "antibiotic".to_string();
        assert!(!query.matches(&other_category));
    }

    #[test]
    fn unknown_selectors_are_ignored() {
        let query = params("category=%20&administration=rectal&count=sachet&expires=someday");
        assert_eq!(query, MedicineQuery::new(today()));
    }

    #[test]
    fn expiry_windows_follow_the_calendar() {
        let day = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();

        assert_eq!(ExpiryWindow::Today.bounds(today()), (day(2026, 5, 10), day(2026, 5, 11)));
        assert_eq!(
            ExpiryWindow::PastSevenDays.bounds(today()),
            (day(2026, 5, 3), day(2026, 5, 11))
        );
        assert_eq!(
            ExpiryWindow::ThisMonth.bounds(today()),
            (day(2026, 5, 1), day(2026, 6, 1))
        );
        assert_eq!(
            ExpiryWindow::ThisYear.bounds(today()),
            (day(2026, 1, 1), day(2027, 1, 1))
        );
        assert_eq!(
            ExpiryWindow::ThisMonth.bounds(day(2026, 12, 31)),
            (day(2026, 12, 1), day(2027, 1, 1))
        );

        assert!(ExpiryWindow::ThisMonth.contains(day(2026, 5, 31), today()));
        assert!(!ExpiryWindow::ThisMonth.contains(day(2026, 6, 1), today()));
        assert!(!ExpiryWindow::PastSevenDays.contains(day(2026, 5, 2), today()));
    }

    #[test]
    fn selectors_are_echoed_but_never_sorted_on() {
        let query = params("expires=this_year&administration=inj&count=vial&category=Vitamin%20D&sort=category");
        assert_eq!(query.expires, Some(ExpiryWindow::ThisYear));
        assert_eq!(
            query.to_query_string(),
            "category=Vitamin+D&administration=inj&count=vial&expires=this_year&sort=category&dir=asc"
        );
        assert_eq!(params(&query.page_link(1)), query);

        assert_eq!(params("sort=administration").sort, SortField::Name);
        assert_eq!(params("sort=count").sort, SortField::Name);
    }

    #[test]
    fn filter_and_search_combine() {
        let query = params("filter=low_stock&q=amox");
        let mut low_amox = medicine(1, "Amoxil", "Amoxicillin 500mg", "Antibiotic");
        low_amox.quantity = 2;
        let plenty_amox = medicine(2, "Amoxicillin", "Amoxicillin 250mg", "Antibiotic");
        let mut low_other = medicine(3, "Cetirizine", "Cetirizine 10mg", "Antihistamine");
        low_other.quantity = 0;

        assert!(query.matches(&low_amox));
        assert!(!query.matches(&plenty_amox));
        assert!(!query.matches(&low_other));
    }

    #[test]
    fn ties_fall_back_to_name_then_composition() {
        let a = medicine(1, "Amoxicillin", "Amoxicillin 500mg", "Antibiotic");
        let b = medicine(2, "Amoxicillin", "Amoxicillin 250mg", "Antibiotic");
        let c = medicine(3, "Azithromycin", "Azithromycin 250mg", "Antibiotic");

        let mut items = vec![c.clone(), a.clone(), b.clone()];
        let query = MedicineQuery::new(today()).sorted_by(SortField::Category, SortDirection::Desc);
        items.sort_by(|x, y| query.compare(x, y));

        assert_eq!(items, vec![b, a, c]);
    }

    #[test]
    fn echo_round_trips_through_parser() {
        let query = params("q=co-amoxiclav 625mg&filter=expired&sort=expiration_date&dir=desc&page=2");
        let echoed = query.to_query_string();
        assert_eq!(
            echoed,
            "q=co-amoxiclav+625mg&filter=expired&sort=expiration_date&dir=desc"
        );

        let reparsed = params(&query.page_link(2));
        assert_eq!(reparsed, query);
    }

    #[test]
    fn sort_toggle_flips_active_field_only() {
        let query = params("q=para&sort=quantity&dir=asc&page=4");
        assert_eq!(
            query.sort_link(SortField::Quantity),
            "q=para&sort=quantity&dir=desc"
        );
        assert_eq!(query.sort_link(SortField::Name), "q=para&sort=name&dir=asc");
        assert_eq!(query.toggle_sort(SortField::Name).page, 1);
    }

    #[test]
    fn page_navigation() {
        let page = MedicinePage {
            items: Vec::new(),
            total: 45,
            page: 2,
            page_size: 20,
            query: params("filter=out_of_stock&page=2"),
        };
        assert_eq!(page.num_pages(), 3);
        assert_eq!(
            page.next_link().as_deref(),
            Some("filter=out_of_stock&sort=name&dir=asc&page=3")
        );
        assert_eq!(
            page.previous_link().as_deref(),
            Some("filter=out_of_stock&sort=name&dir=asc&page=1")
        );

        let empty = MedicinePage {
            total: 0,
            page: 1,
            ..page
        };
        assert_eq!(empty.num_pages(), 1);
        assert!(!empty.has_next());
        assert!(!empty.has_previous());
    }

    #[test]
    fn offset_is_zero_based() {
        let query = MedicineQuery::new(today()).at_page(3);
        assert_eq!(query.offset(20), 40);
        assert_eq!(MedicineQuery::new(today()).offset(20), 0);
    }
}
