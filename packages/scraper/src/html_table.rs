//! HTML table extractor.
//!
//! Sports-reference pages ship some tables inside HTML comments and unhide
//! them with JavaScript, so a plain CSS lookup can miss the table entirely.
//! [`extract_table`] first looks in the document, then parses every comment
//! that contains a `<table` as its own fragment and looks again.
//!
//! The located table is returned as an [`ExtractedTable`] that owns the
//! parsed fragment; [`ExtractedTable::rows`] walks the body lazily.

use nba_stats_models::{RawRow, TableSchema};
use scraper::{ElementRef, Html, Selector};

use crate::ScrapeError;

/// Classes sports-reference puts on repeated header rows inside `<tbody>`.
const NON_DATA_ROW_CLASSES: &[&str] = &["thead", "over_header"];

/// Where the table was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableLocation {
    /// Directly in the parsed document.
    Document,
    /// Inside the `index`-th HTML comment (zero-based, document order).
    Comment {
        /// Ordinal of the comment among all comments in the page.
        index: usize,
    },
}

impl std::fmt::Display for TableLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Document => f.write_str("document"),
            Self::Comment { index } => write!(f, "comment #{index}"),
        }
    }
}

/// Parsed CSS selectors used by the extractor.
#[derive(Debug, Clone)]
struct TableSelectors {
    by_id: Selector,
    any_table: Selector,
    head_row: Selector,
    any_row: Selector,
    body_row: Selector,
    cell: Selector,
}

impl TableSelectors {
    fn new(table_id: &str) -> Result<Self, ScrapeError> {
        if table_id.contains(['"', '\\']) {
            return Err(ScrapeError::Parse(format!("invalid table id {table_id:?}")));
        }
        Ok(Self {
            by_id: parse_selector(&format!("table[id=\"{table_id}\"]"))?,
            any_table: parse_selector("table")?,
            head_row: parse_selector("thead tr")?,
            any_row: parse_selector("tr")?,
            body_row: parse_selector("tbody tr")?,
            cell: parse_selector("th, td")?,
        })
    }
}

/// Parses a CSS selector string, returning a [`ScrapeError`] on failure.
fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector)
        .map_err(|e| ScrapeError::Parse(format!("invalid CSS selector '{selector}': {e}")))
}

/// A located table together with the fragment it lives in.
#[derive(Debug)]
pub struct ExtractedTable {
    html: Html,
    table_index: usize,
    location: TableLocation,
    headers: Vec<String>,
    header_repeat_label: String,
    selectors: TableSelectors,
}

impl ExtractedTable {
    /// Where the table was found.
    #[must_use]
    pub const fn location(&self) -> TableLocation {
        self.location
    }

    /// Header labels in column order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    fn table(&self) -> Option<ElementRef<'_>> {
        self.html
            .select(&self.selectors.any_table)
            .nth(self.table_index)
    }

    /// Iterates over the data rows in document order.
    ///
    /// Repeated header rows are skipped. Short rows are padded with absent
    /// values; cells beyond the header width are ignored.
    pub fn rows(&self) -> impl Iterator<Item = RawRow> + '_ {
        self.table()
            .into_iter()
            .flat_map(move |table| table.select(&self.selectors.body_row))
            .filter_map(move |tr| self.raw_row(tr))
    }

    fn raw_row(&self, tr: ElementRef<'_>) -> Option<RawRow> {
        if tr
            .value()
            .classes()
            .any(|c| NON_DATA_ROW_CLASSES.contains(&c))
        {
            log::debug!("Skipping header-repeat row");
            return None;
        }

        let cells: Vec<String> = tr.select(&self.selectors.cell).map(cell_text).collect();

        if cells.is_empty() {
            return None;
        }
        if cells[0].trim() == self.header_repeat_label {
            log::debug!("Skipping header-repeat row");
            return None;
        }

        let mut row = RawRow::new();
        for (i, header) in self.headers.iter().enumerate() {
            match cells.get(i) {
                Some(text) if text.trim().is_empty() => row.push(header.as_str(), None),
                Some(text) => row.push(header.as_str(), Some(text.clone())),
                None => row.push_padding(header.as_str()),
            }
        }
        Some(row)
    }
}

/// Concatenated text content of a cell, untrimmed.
fn cell_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

/// Header labels of a table: the last `<thead>` row (sports-reference adds
/// a grouping row above the real one), or the first row if there's no
/// `<thead>`.
fn header_labels(table: ElementRef<'_>, selectors: &TableSelectors) -> Vec<String> {
    let header_row = table
        .select(&selectors.head_row)
        .last()
        .or_else(|| table.select(&selectors.any_row).next());

    header_row.map_or_else(Vec::new, |row| {
        row.select(&selectors.cell)
            .map(|el| cell_text(el).trim().to_owned())
            .collect()
    })
}

/// Index (among all `<table>`s in `html`) of the table with the target id.
fn find_by_id(html: &Html, selectors: &TableSelectors) -> Option<usize> {
    let target = html.select(&selectors.by_id).next()?;
    html.select(&selectors.any_table)
        .position(|t| t.id() == target.id())
}

/// Index of the first table whose header has at least `min` known labels.
fn find_by_columns(
    html: &Html,
    selectors: &TableSelectors,
    schema: &TableSchema,
    min: usize,
) -> Option<usize> {
    html.select(&selectors.any_table).position(|table| {
        let matched = header_labels(table, selectors)
            .iter()
            .filter(|label| schema.field_for_label(label).is_some())
            .count();
        matched >= min
    })
}

/// Text of every comment in the page, in document order.
fn comments(document: &Html) -> Vec<String> {
    document
        .tree
        .root()
        .descendants()
        .filter_map(|node| node.value().as_comment().map(|c| String::from(&**c)))
        .collect()
}

/// Locates the schema's table in `page` and prepares it for row iteration.
///
/// Search order: the document by id, every comment by id, then (only if the
/// schema sets `min_matching_columns`) the document and comments again by
/// header labels.
///
/// # Errors
///
/// Returns [`ScrapeError::TableNotFound`] if no candidate exists anywhere,
/// and [`ScrapeError::MissingHeader`] if the located table has no header
/// cells. An existing but empty table yields an empty row iterator.
pub fn extract_table(page: &str, schema: &TableSchema) -> Result<ExtractedTable, ScrapeError> {
    let selectors = TableSelectors::new(&schema.table_id)?;
    let document = Html::parse_document(page);

    if let Some(index) = find_by_id(&document, &selectors) {
        return build(document, index, TableLocation::Document, schema, selectors);
    }

    let mut fragments = Vec::new();
    for (i, text) in comments(&document).into_iter().enumerate() {
        if !text.contains("<table") {
            continue;
        }
        let fragment = Html::parse_fragment(&text);
        if let Some(index) = find_by_id(&fragment, &selectors) {
            log::info!(
                "Table '{}' found inside comment #{i}",
                schema.table_id
            );
            return build(
                fragment,
                index,
                TableLocation::Comment { index: i },
                schema,
                selectors,
            );
        }
        fragments.push((i, fragment));
    }

    if let Some(min) = schema.min_matching_columns {
        if let Some(index) = find_by_columns(&document, &selectors, schema, min) {
            log::warn!(
                "Table '{}' not found by id; using document table #{index} by column labels",
                schema.table_id
            );
            return build(document, index, TableLocation::Document, schema, selectors);
        }
        for (i, fragment) in fragments {
            if let Some(index) = find_by_columns(&fragment, &selectors, schema, min) {
                log::warn!(
                    "Table '{}' not found by id; using table in comment #{i} by column labels",
                    schema.table_id
                );
                return build(
                    fragment,
                    index,
                    TableLocation::Comment { index: i },
                    schema,
                    selectors,
                );
            }
        }
    }

    Err(ScrapeError::TableNotFound {
        table_id: schema.table_id.clone(),
    })
}

fn build(
    html: Html,
    table_index: usize,
    location: TableLocation,
    schema: &TableSchema,
    selectors: TableSelectors,
) -> Result<ExtractedTable, ScrapeError> {
    let headers = html
        .select(&selectors.any_table)
        .nth(table_index)
        .map(|table| header_labels(table, &selectors))
        .unwrap_or_default();

    if headers.is_empty() {
        return Err(ScrapeError::MissingHeader {
            table_id: schema.table_id.clone(),
        });
    }

    report_drift(&headers, schema);

    Ok(ExtractedTable {
        html,
        table_index,
        location,
        headers,
        header_repeat_label: schema.header_repeat_label.clone(),
        selectors,
    })
}

/// Logs configured fields absent from the header and header labels the
/// schema doesn't know.
fn report_drift(headers: &[String], schema: &TableSchema) {
    let mut fields: Vec<_> = schema.columns.iter().map(|c| c.field).collect();
    fields.sort_unstable();
    fields.dedup();
    for field in fields {
        let present = schema
            .columns
            .iter()
            .filter(|c| c.field == field)
            .any(|c| headers.contains(&c.label));
        if !present {
            log::warn!("Expected column for {field} not present in table header");
        }
    }

    for label in headers {
        if schema.field_for_label(label).is_none() {
            log::debug!("Dropping unmapped column {label:?}");
        }
    }
}

#[cfg(test)]
mod tests {
    use nba_stats_models::{ColumnMapping, StatField};

    use super::*;

    fn schema() -> TableSchema {
        let columns = [
            ("Rk", StatField::Rank),
            ("Player", StatField::Player),
            ("Age", StatField::Age),
            ("Tm", StatField::Team),
            ("PTS", StatField::PointsPerGame),
        ]
        .into_iter()
        .map(|(label, field)| ColumnMapping {
            label: label.to_string(),
            field,
        })
        .collect();

        TableSchema {
            id: "test".to_string(),
            name: "Test".to_string(),
            table_id: "per_game_stats".to_string(),
            url_template: None,
            destination: "player_stats".to_string(),
            header_repeat_label: "Rk".to_string(),
            min_matching_columns: None,
            percentage_epsilon: 0.001,
            columns,
            bounds: std::collections::BTreeMap::new(),
        }
    }

    const TABLE: &str = r#"
        <table id="per_game_stats">
          <thead>
            <tr class="over_header"><th colspan="3">Per Game</th></tr>
            <tr><th>Rk</th><th>Player</th><th>Age</th><th>Tm</th><th>PTS</th></tr>
          </thead>
          <tbody>
            <tr><th>1</th><td>Precious Achiuwa</td><td>24</td><td>TOT</td><td>7.6</td></tr>
            <tr><th>1</th><td>Precious Achiuwa</td><td>24</td><td>TOR</td><td>6.8</td></tr>
            <tr class="thead"><th>Rk</th><td>Player</td><td>Age</td><td>Tm</td><td>PTS</td></tr>
            <tr><th>2</th><td>Bam Adebayo</td><td>26</td><td>MIA</td><td>19.3</td></tr>
            <tr><th>Rk</th><td>Player</td><td>Age</td><td>Tm</td><td>PTS</td></tr>
            <tr><th>3</th><td>Ochai Agbaji</td><td></td></tr>
          </tbody>
        </table>
    "#;

    fn page_with(body: &str) -> String {
        format!("<!DOCTYPE html><html><head><title>t</title></head><body>{body}</body></html>")
    }

    #[test]
    fn finds_table_directly_in_document() {
        let table = extract_table(&page_with(TABLE), &schema()).unwrap();
        assert_eq!(table.location(), TableLocation::Document);
        assert_eq!(table.headers(), ["Rk", "Player", "Age", "Tm", "PTS"]);
    }

    #[test]
    fn finds_table_only_inside_comment() {
        let body = format!(
            "<div id=\"all_other\"><!-- unrelated --></div>\
             <div id=\"all_per_game_stats\"><!--{TABLE}--></div>"
        );
        let table = extract_table(&page_with(&body), &schema()).unwrap();

        assert_eq!(table.location(), TableLocation::Comment { index: 1 });
        let rows: Vec<RawRow> = table.rows().collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[2].get("Player"), Some("Bam Adebayo"));
    }

    #[test]
    fn missing_table_is_an_error_not_an_empty_sequence() {
        let body = "<table id=\"advanced_stats\"><thead><tr><th>Rk</th></tr></thead></table>\
                    <!-- <p>no tables here</p> -->";
        let err = extract_table(&page_with(body), &schema()).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::TableNotFound { ref table_id } if table_id == "per_game_stats"
        ));
    }

    #[test]
    fn skips_header_repeat_rows_and_keeps_traded_rows() {
        let table = extract_table(&page_with(TABLE), &schema()).unwrap();
        let rows: Vec<RawRow> = table.rows().collect();

        let teams: Vec<Option<&str>> = rows.iter().map(|r| r.get("Tm")).collect();
        assert_eq!(teams, vec![Some("TOT"), Some("TOR"), Some("MIA"), None]);
        assert!(rows.iter().all(|r| r.get("Rk") != Some("Rk")));
    }

    #[test]
    fn pads_short_rows_and_marks_empty_cells_absent() {
        let table = extract_table(&page_with(TABLE), &schema()).unwrap();
        let last = table.rows().last().unwrap();

        assert_eq!(last.len(), 5);
        assert_eq!(last.get("Player"), Some("Ochai Agbaji"));
        assert_eq!(last.get("Age"), None);
        assert_eq!(last.padded(), 2);
    }

    #[test]
    fn empty_table_yields_no_rows() {
        let body = "<table id=\"per_game_stats\"><thead><tr><th>Rk</th><th>Player</th></tr></thead>\
                    <tbody></tbody></table>";
        let table = extract_table(&page_with(body), &schema()).unwrap();
        assert_eq!(table.rows().count(), 0);
    }

    #[test]
    fn table_without_header_is_rejected() {
        let body = "<table id=\"per_game_stats\"></table>";
        let err = extract_table(&page_with(body), &schema()).unwrap_err();
        assert!(matches!(err, ScrapeError::MissingHeader { .. }));
    }

    #[test]
    fn column_heuristic_only_when_enabled() {
        let renamed = TABLE.replace("per_game_stats", "per_game_stats_2025");
        let page = page_with(&renamed);

        assert!(extract_table(&page, &schema()).is_err());

        let mut schema = schema();
        schema.min_matching_columns = Some(4);
        let table = extract_table(&page, &schema).unwrap();
        assert_eq!(table.rows().count(), 4);
    }

    #[test]
    fn id_match_in_comment_beats_heuristic_match_in_document() {
        let decoy = TABLE.replace("per_game_stats", "totals_stats");
        let body = format!("{decoy}<!--{TABLE}-->");
        let mut schema = schema();
        schema.min_matching_columns = Some(3);

        let table = extract_table(&page_with(&body), &schema).unwrap();
        assert_eq!(table.location(), TableLocation::Comment { index: 0 });
    }
}
