//! Typed render tree.
//!
//! DESIGN
//! ======
//! Pages never build markup strings. They build a [`View`] tree whose text and
//! attribute values are plain data; [`render_html`] escapes every one of them
//! on output, and [`render_text`] produces the terminal rendering used by the
//! CLI. Interactive elements carry a `data-action` attribute naming the
//! [`crate::app::Action`] they trigger, so event handling is delegated to the
//! app instead of being bound per element.

use std::fmt::Write as _;

#[cfg(test)]
#[path = "view_test.rs"]
mod tests;

/// Elements rendered without a closing tag.
const VOID_TAGS: [&str; 4] = ["br", "hr", "img", "input"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum View {
    Element(Element),
    Text(String),
    Fragment(Vec<View>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub tag: &'static str,
    pub attrs: Vec<(&'static str, String)>,
    pub children: Vec<View>,
}

impl Element {
    #[must_use]
    pub fn new(tag: &'static str) -> Self {
        Self { tag, attrs: Vec::new(), children: Vec::new() }
    }

    #[must_use]
    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.attrs.push((name, value.into()));
        self
    }

    #[must_use]
    pub fn class(self, value: impl Into<String>) -> Self {
        self.attr("class", value)
    }

    #[must_use]
    pub fn child(mut self, child: impl Into<View>) -> Self {
        self.children.push(child.into());
        self
    }

    #[must_use]
    pub fn children<I, V>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<View>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(View::Text(text.into()))
    }

    #[must_use]
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.iter().find(|(k, _)| *k == name).map(|(_, v)| v.as_str())
    }
}

impl From<Element> for View {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<String> for View {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for View {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl View {
    #[must_use]
    pub fn empty() -> Self {
        Self::Fragment(Vec::new())
    }

    /// Every `data-action` in the tree, in document order.
    #[must_use]
    pub fn actions(&self) -> Vec<String> {
        let mut found = Vec::new();
        self.visit(&mut |el| {
            if let Some(action) = el.get_attr("data-action") {
                found.push(action.to_owned());
            }
        });
        found
    }

    fn visit(&self, f: &mut impl FnMut(&Element)) {
        match self {
            Self::Element(el) => {
                f(el);
                for child in &el.children {
                    child.visit(f);
                }
            }
            Self::Fragment(children) => {
                for child in children {
                    child.visit(f);
                }
            }
            Self::Text(_) => {}
        }
    }
}

// =============================================================================
// BUILDERS
// =============================================================================

#[must_use]
pub fn el(tag: &'static str) -> Element {
    Element::new(tag)
}

#[must_use]
pub fn text(value: impl Into<String>) -> View {
    View::Text(value.into())
}

#[must_use]
pub fn heading(level: u8, value: impl Into<String>) -> Element {
    let tag = match level {
        1 => "h1",
        2 => "h2",
        3 => "h3",
        _ => "h4",
    };
    el(tag).text(value)
}

#[must_use]
pub fn paragraph(value: impl Into<String>) -> Element {
    el("p").text(value)
}

#[must_use]
pub fn link(href: impl Into<String>, label: impl Into<String>) -> Element {
    el("a").attr("href", href).text(label)
}

/// A control that triggers an app action when activated.
#[must_use]
pub fn button(action: impl Into<String>, label: impl Into<String>) -> Element {
    el("button").attr("type", "button").attr("data-action", action).text(label)
}

#[must_use]
pub fn input(name: &'static str, kind: &'static str, value: impl Into<String>) -> Element {
    el("input").attr("name", name).attr("type", kind).attr("value", value)
}

/// Bootstrap-style alert block: `level` is `info`, `success`, `warning` or `danger`.
#[must_use]
pub fn alert(level: &str, message: impl Into<String>) -> Element {
    el("div").class(format!("alert alert-{level}")).attr("role", "alert").text(message)
}

#[must_use]
pub fn list<I, V>(items: I) -> Element
where
    I: IntoIterator<Item = V>,
    V: Into<View>,
{
    el("ul").children(items.into_iter().map(|item| el("li").child(item)))
}

#[must_use]
pub fn table(headers: &[&str], rows: Vec<Vec<View>>) -> Element {
    let head = el("thead").child(el("tr").children(headers.iter().map(|h| el("th").text(*h))));
    let body = el("tbody").children(rows.into_iter().map(|row| el("tr").children(row.into_iter().map(|cell| el("td").child(cell)))));
    el("table").class("table").child(head).child(body)
}

// =============================================================================
// RENDERERS
// =============================================================================

/// Escape text or attribute content for HTML output.
#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[must_use]
pub fn render_html(view: &View) -> String {
    let mut out = String::new();
    write_html(view, &mut out);
    out
}

fn write_html(view: &View, out: &mut String) {
    match view {
        View::Text(value) => out.push_str(&escape_html(value)),
        View::Fragment(children) => children.iter().for_each(|child| write_html(child, out)),
        View::Element(el) => {
            out.push('<');
            out.push_str(el.tag);
            for (name, value) in &el.attrs {
                let _ = write!(out, " {name}=\"{}\"", escape_html(value));
            }
            out.push('>');
            if VOID_TAGS.contains(&el.tag) {
                return;
            }
            for child in &el.children {
                write_html(child, out);
            }
            let _ = write!(out, "</{}>", el.tag);
        }
    }
}

/// Plain-text rendering for terminals.
#[must_use]
pub fn render_text(view: &View) -> String {
    let mut out = String::new();
    write_text(view, &mut out);
    let mut lines: Vec<&str> = out.lines().map(str::trim_end).collect();
    lines.dedup_by(|a, b| a.is_empty() && b.is_empty());
    lines.join("\n").trim().to_owned()
}

fn inline_text(children: &[View]) -> String {
    let mut out = String::new();
    for child in children {
        write_text(child, &mut out);
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn write_text(view: &View, out: &mut String) {
    match view {
        View::Text(value) => out.push_str(value),
        View::Fragment(children) => children.iter().for_each(|child| write_text(child, out)),
        View::Element(el) => write_element_text(el, out),
    }
}

fn write_element_text(el: &Element, out: &mut String) {
    match el.tag {
        "h1" | "h2" | "h3" | "h4" => {
            let marks = match el.tag {
                "h1" => "#",
                "h2" => "##",
                "h3" => "###",
                _ => "####",
            };
            let _ = write!(out, "\n{marks} {}\n", inline_text(&el.children));
        }
        "p" | "div" | "form" | "section" | "nav" | "header" => {
            out.push('\n');
            if let Some(class) = el.get_attr("class").filter(|c| c.starts_with("alert")) {
                let level = class.rsplit('-').next().unwrap_or("info").to_uppercase();
                let _ = write!(out, "[{level}] {}", inline_text(&el.children));
            } else {
                el.children.iter().for_each(|child| write_text(child, out));
            }
            out.push('\n');
        }
        "a" => {
            let label = inline_text(&el.children);
            match el.get_attr("href") {
                Some(href) => {
                    let _ = write!(out, "{label} <{href}>");
                }
                None => out.push_str(&label),
            }
        }
        "button" => {
            let _ = write!(out, "[{}]", inline_text(&el.children));
        }
        "input" => {
            let name = el.get_attr("name").unwrap_or_default();
            let value = if el.get_attr("type") == Some("password") { "" } else { el.get_attr("value").unwrap_or_default() };
            let _ = writeln!(out, "{name}: {value}");
        }
        "ul" | "ol" => {
            out.push('\n');
            for child in &el.children {
                let View::Element(item) = child else { continue };
                let _ = writeln!(out, "- {}", inline_text(&item.children));
            }
        }
        "table" => write_table_text(el, out),
        "br" | "hr" => out.push('\n'),
        _ => el.children.iter().for_each(|child| write_text(child, out)),
    }
}

fn table_rows(section: &Element) -> Vec<Vec<String>> {
    section
        .children
        .iter()
        .filter_map(|row| match row {
            View::Element(row) => Some(
                row.children
                    .iter()
                    .map(|cell| match cell {
                        View::Element(cell) => inline_text(&cell.children),
                        other => inline_text(std::slice::from_ref(other)),
                    })
                    .collect(),
            ),
            _ => None,
        })
        .collect()
}

fn write_table_text(table: &Element, out: &mut String) {
    let mut rows = Vec::new();
    for section in &table.children {
        if let View::Element(section) = section {
            rows.extend(table_rows(section));
        }
    }
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|i| rows.iter().filter_map(|r| r.get(i)).map(|c| c.chars().count()).max().unwrap_or(0))
        .collect();
    out.push('\n');
    for (index, row) in rows.iter().enumerate() {
        let cells: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        let _ = writeln!(out, "| {} |", cells.join(" | "));
        if index == 0 {
            let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            let _ = writeln!(out, "| {} |", rule.join(" | "));
        }
    }
    if rows.len() <= 1 {
        out.push_str("(none)\n");
    }
}
