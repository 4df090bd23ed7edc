// Label/value extraction shared by the status page parsers.
//
// LuCI status pages render their data as two-column tables, but the
// markup differs between firmware builds: mobile `p.visible-xs` cells,
// plain `td` pairs, `th`/`td` pairs, and on a few pages `div` rows with
// label/value children.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::trace;

pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector")
}

pub(crate) fn pattern(re: &'static str) -> Regex {
    Regex::new(re).expect("static pattern")
}

/// Trimmed text content of an element and its descendants.
pub(crate) fn text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_owned()
}

fn has_class_matching(el: ElementRef<'_>, re: &Regex) -> bool {
    el.value().classes().any(|class| re.is_match(class))
}

static ROWS: LazyLock<Selector> = LazyLock::new(|| selector("table tr"));
static MOBILE_CELLS: LazyLock<Selector> = LazyLock::new(|| selector("td p.visible-xs"));
static TD: LazyLock<Selector> = LazyLock::new(|| selector("td"));
static TH: LazyLock<Selector> = LazyLock::new(|| selector("th"));
static P: LazyLock<Selector> = LazyLock::new(|| selector("p"));
static SPAN: LazyLock<Selector> = LazyLock::new(|| selector("span"));
static DIV: LazyLock<Selector> = LazyLock::new(|| selector("div"));
static ANY: LazyLock<Selector> = LazyLock::new(|| selector("*"));

static ROW_CLASS: LazyLock<Regex> = LazyLock::new(|| pattern("row|item|info"));
static LABEL_CLASS: LazyLock<Regex> = LazyLock::new(|| pattern("label|key|name|title"));
static VALUE_CLASS: LazyLock<Regex> = LazyLock::new(|| pattern("value|data|content"));

/// Label → value pairs scraped from a status page.
///
/// Repeated labels are kept as `Label2`, `Label3`, ... unless the earlier
/// value was empty, in which case it is overwritten.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Fields(HashMap<String, String>);

impl Fields {
    pub fn parse(html: &str) -> Self {
        let mut fields = Self::default();
        if html.trim().is_empty() {
            return fields;
        }
        let doc = Html::parse_document(html);

        for row in doc.select(&ROWS) {
            let mut cells: Vec<String> = row
                .select(&MOBILE_CELLS)
                .map(text)
                .filter(|t| !t.is_empty())
                .collect();

            if cells.len() < 2 {
                cells = row
                    .select(&TD)
                    .map(|td| {
                        let inner = td.select(&P).next().or_else(|| td.select(&SPAN).next());
                        text(inner.unwrap_or(td))
                    })
                    .filter(|t| !t.is_empty())
                    .collect();
            }

            if cells.len() < 2 {
                if let (Some(th), Some(td)) = (row.select(&TH).next(), row.select(&TD).next()) {
                    let label = text(th);
                    if !label.is_empty() {
                        cells = vec![label, text(td)];
                    }
                }
            }

            match cells.as_slice() {
                [label, value, ..] => fields.add_unique(label, value.replace('\n', "")),
                [label] => fields.add_unique(label, String::new()),
                [] => {}
            }
        }

        for div in doc.select(&DIV) {
            if !has_class_matching(div, &ROW_CLASS) {
                continue;
            }
            let label = div.select(&ANY).find(|el| has_class_matching(*el, &LABEL_CLASS));
            let value = div.select(&ANY).find(|el| has_class_matching(*el, &VALUE_CLASS));
            if let (Some(label), Some(value)) = (label, value) {
                let label = text(label);
                if !label.is_empty() && !fields.0.contains_key(&label) {
                    fields.add_unique(&label, text(value).replace('\n', ""));
                }
            }
        }

        if !fields.0.is_empty() {
            trace!(keys = ?fields.0.keys().collect::<Vec<_>>(), "parsed table fields");
        }
        fields
    }

    fn add_unique(&mut self, label: &str, value: String) {
        let mut key = label.to_owned();
        let mut n = 1;
        while self.0.get(&key).is_some_and(|v| !v.is_empty()) {
            n += 1;
            key = format!("{label}{n}");
        }
        self.0.insert(key, value);
    }

    /// Non-empty value stored under `label`.
    pub fn get(&self, label: &str) -> Option<&str> {
        self.0
            .get(label)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// First non-empty value among `labels`, in order.
    pub fn first(&self, labels: &[&str]) -> Option<&str> {
        labels.iter().find_map(|label| self.get(label))
    }

    /// First value among `labels` that parses as an integer.
    pub fn first_int(&self, labels: &[&str]) -> Option<i64> {
        labels
            .iter()
            .find_map(|label| crate::parse::as_int(self.get(label)))
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
