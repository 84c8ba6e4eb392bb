use crate::parser::SectionKind;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use xkbrev_core::{LayoutRequest, XkbError};

const MAX_INCLUDE_DEPTH: usize = 8;

/// Component expressions a rules file selects for a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Components {
    pub keycodes: String,
    pub types: String,
    pub compat: String,
    pub symbols: String,
    pub geometry: String,
}

impl Components {
    fn slot(&mut self, kind: SectionKind) -> &mut String {
        match kind {
            SectionKind::Keycodes => &mut self.keycodes,
            SectionKind::Types => &mut self.types,
            SectionKind::Compat => &mut self.compat,
            SectionKind::Symbols => &mut self.symbols,
            SectionKind::Geometry => &mut self.geometry,
        }
    }

    /// Merge an expanded rule value into a component.
    ///
    /// `+x`/`|x` are appended. A plain value fills an empty component, goes in
    /// front of a component that only holds `+`/`|` parts, and is dropped
    /// otherwise.
    fn append(&mut self, kind: SectionKind, value: &str) {
        if value.is_empty() {
            return;
        }
        let slot = self.slot(kind);
        let value_merges = value.starts_with(['+', '|']);
        if value_merges || slot.is_empty() {
            slot.push_str(value);
        } else if slot.starts_with(['+', '|']) {
            slot.insert_str(0, value);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Model,
    Layout,
    Variant,
    Option,
}

#[derive(Debug, Clone)]
struct Rule {
    values: Vec<String>,
    target: String,
    line: usize,
}

#[derive(Debug, Clone)]
struct Mapping {
    columns: Vec<Column>,
    component: SectionKind,
    rules: Vec<Rule>,
}

impl Mapping {
    fn has_options(&self) -> bool {
        self.columns.contains(&Column::Option)
    }
}

/// A parsed `rules/<name>` file with its includes expanded
#[derive(Debug, Default)]
pub struct Rules {
    pub name: String,
    groups: HashMap<String, Vec<String>>,
    mappings: Vec<Mapping>,
    // Models the ruleset's `.lst` file declares, when it has one
    models: Option<HashSet<String>>,
}

impl Rules {
    pub fn from_file(path: &Path) -> Result<Rules, XkbError> {
        let mut rules = Rules {
            name: path.display().to_string(),
            ..Rules::default()
        };
        rules.load(path, 0)?;
        Ok(rules)
    }

    /// Only accept the models named in `models`
    pub fn with_models(mut self, models: HashSet<String>) -> Self {
        self.models = Some(models);
        self
    }

    /// Parse rules text; `%S` in includes refers to `dir`
    pub fn parse(text: &str, file: &str, dir: &Path) -> Result<Rules, XkbError> {
        let mut rules = Rules {
            name: file.to_string(),
            ..Rules::default()
        };
        rules.parse_into(text, file, dir, 0)?;
        Ok(rules)
    }

    fn load(&mut self, path: &Path, depth: usize) -> Result<(), XkbError> {
        if depth > MAX_INCLUDE_DEPTH {
            return Err(XkbError::parse(
                path.display().to_string(),
                0,
                "Rules include nesting too deep",
            ));
        }

        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(XkbError::not_found("rules", path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        self.parse_into(&text, &path.display().to_string(), dir, depth)
    }

    fn parse_into(&mut self, text: &str, file: &str, dir: &Path, depth: usize) -> Result<(), XkbError> {
        // None while inside a mapping that does not apply to a single layout
        let mut current: Option<Mapping> = None;
        let mut in_mapping = false;

        for (line_no, line) in logical_lines(text) {
            let line = match line.find("//") {
                Some(pos) => &line[..pos],
                None => line.as_str(),
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(header) = line.strip_prefix('!') {
                let header = header.trim();

                if let Some(target) = header.strip_prefix("include") {
                    if let Some(mapping) = current.take() {
                        self.mappings.push(mapping);
                    }
                    in_mapping = false;
                    let target = expand_include_path(target.trim(), dir);
                    log::debug!("{}:{}: include {}", file, line_no, target);
                    self.load(Path::new(&target), depth + 1)?;
                    continue;
                }

                let (lhs, rhs) = split_assignment(header)
                    .ok_or_else(|| XkbError::parse(file, line_no, "Expected '=' in rules header"))?;

                if let Some(group) = lhs.strip_prefix('$') {
                    let members = rhs.split_whitespace().map(str::to_string).collect();
                    self.groups.insert(group.trim().to_string(), members);
                    continue;
                }

                if let Some(mapping) = current.take() {
                    self.mappings.push(mapping);
                }
                in_mapping = true;
                current = parse_mapping_header(lhs, rhs);
                if current.is_none() {
                    log::debug!("{}:{}: skipping mapping '{}'", file, line_no, header);
                }
                continue;
            }

            if !in_mapping {
                return Err(XkbError::parse(file, line_no, "Rule outside of a mapping"));
            }
            let Some(mapping) = current.as_mut() else {
                continue;
            };

            let (lhs, rhs) = split_assignment(line)
                .ok_or_else(|| XkbError::parse(file, line_no, "Expected '=' in rule"))?;
            let values: Vec<String> = lhs.split_whitespace().map(str::to_string).collect();
            if values.len() != mapping.columns.len() {
                return Err(XkbError::parse(
                    file,
                    line_no,
                    format!("Expected {} values, found {}", mapping.columns.len(), values.len()),
                ));
            }
            mapping.rules.push(Rule {
                values,
                target: rhs.trim().to_string(),
                line: line_no,
            });
        }

        if let Some(mapping) = current.take() {
            self.mappings.push(mapping);
        }
        Ok(())
    }

    /// Select the component expressions for `request`
    pub fn resolve(&self, request: &LayoutRequest) -> Result<Components, XkbError> {
        let mut components = Components::default();
        let mut matched_options: HashSet<&str> = HashSet::new();

        // Model rules end in `*`, so only the model list can reject a name
        if let Some(models) = &self.models {
            if !models.contains(&request.model) {
                return Err(XkbError::not_found("model", request.model.clone()));
            }
        }

        for mapping in &self.mappings {
            for rule in &mapping.rules {
                let fixed_match = mapping
                    .columns
                    .iter()
                    .zip(&rule.values)
                    .filter(|(column, _)| **column != Column::Option)
                    .all(|(column, pattern)| self.matches(pattern, self.column_value(*column, request)));
                if !fixed_match {
                    continue;
                }

                if mapping.has_options() {
                    let Some(pattern) = mapping
                        .columns
                        .iter()
                        .position(|c| *c == Column::Option)
                        .map(|i| rule.values[i].as_str())
                    else {
                        continue;
                    };
                    let hits: Vec<&str> = request
                        .options
                        .iter()
                        .map(String::as_str)
                        .filter(|option| self.matches(pattern, option))
                        .collect();
                    if hits.is_empty() {
                        continue;
                    }
                    matched_options.extend(hits);
                    log::debug!("{}:{}: option rule '{}' applies", self.name, rule.line, pattern);
                    components.append(mapping.component, &expand(&rule.target, request));
                } else {
                    log::debug!(
                        "{}:{}: {} = {}",
                        self.name,
                        rule.line,
                        mapping.component.dir(),
                        rule.target
                    );
                    components.append(mapping.component, &expand(&rule.target, request));
                    break;
                }
            }
        }

        if let Some(option) = request
            .options
            .iter()
            .find(|option| !matched_options.contains(option.as_str()))
        {
            return Err(XkbError::not_found("option", option.clone()));
        }
        if components.keycodes.is_empty() {
            return Err(XkbError::not_found("model", request.model.clone()));
        }
        if components.symbols.is_empty() {
            return Err(XkbError::not_found("layout", request.to_string()));
        }

        Ok(components)
    }

    fn column_value<'r>(&self, column: Column, request: &'r LayoutRequest) -> &'r str {
        match column {
            Column::Model => &request.model,
            Column::Layout => &request.layout,
            Column::Variant => request.variant(),
            Column::Option => "",
        }
    }

    fn matches(&self, pattern: &str, value: &str) -> bool {
        if pattern == "*" {
            return true;
        }
        match pattern.strip_prefix('$') {
            Some(group) => self
                .groups
                .get(group)
                .map(|members| members.iter().any(|m| m == value))
                .unwrap_or(false),
            None => pattern == value,
        }
    }
}

/// Read the `! model` section of a rules `.lst` file.
///
/// A ruleset without a list yields `None` and any model is accepted.
pub fn read_model_list(path: &Path) -> Result<Option<HashSet<String>>, XkbError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("No model list at {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let mut models = HashSet::new();
    let mut in_models = false;
    for line in text.lines() {
        let line = line.trim();
        if let Some(header) = line.strip_prefix('!') {
            in_models = header.trim() == "model";
            continue;
        }
        if in_models {
            if let Some(name) = line.split_whitespace().next() {
                models.insert(name.to_string());
            }
        }
    }
    Ok(Some(models))
}

/// Lines with `\` continuations joined, numbered by their first physical line
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (index, raw) in text.lines().enumerate() {
        let (start, mut joined) = pending.take().unwrap_or((index + 1, String::new()));
        match raw.strip_suffix('\\') {
            Some(head) => {
                joined.push_str(head);
                joined.push(' ');
                pending = Some((start, joined));
            }
            None => {
                joined.push_str(raw);
                lines.push((start, joined));
            }
        }
    }
    if let Some(last) = pending {
        lines.push(last);
    }
    lines
}

fn split_assignment(line: &str) -> Option<(&str, &str)> {
    let pos = line.find('=')?;
    Some((line[..pos].trim(), &line[pos + 1..]))
}

fn parse_mapping_header(lhs: &str, rhs: &str) -> Option<Mapping> {
    let mut columns = Vec::new();
    for word in lhs.split_whitespace() {
        // layout[1] and friends address multi-group requests
        if word.contains('[') {
            return None;
        }
        columns.push(match word {
            "model" => Column::Model,
            "layout" => Column::Layout,
            "variant" => Column::Variant,
            "option" => Column::Option,
            _ => return None,
        });
    }

    let component = match rhs.trim() {
        "keycodes" => SectionKind::Keycodes,
        "types" => SectionKind::Types,
        "compat" | "compatibility" => SectionKind::Compat,
        "symbols" => SectionKind::Symbols,
        "geometry" => SectionKind::Geometry,
        _ => return None,
    };

    Some(Mapping {
        columns,
        component,
        rules: Vec::new(),
    })
}

fn expand_include_path(target: &str, dir: &Path) -> String {
    let home = std::env::var("HOME").unwrap_or_default();
    target
        .replace("%S", &dir.display().to_string())
        .replace("%H", &home)
}

/// Expand `%m`, `%l`, `%v` and their `%+l`, `%(v)` forms in a rule value
fn expand(value: &str, request: &LayoutRequest) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }

        let prefix = match chars.peek() {
            Some(&p @ ('+' | '|' | '_' | '-' | '(')) => {
                chars.next();
                Some(p)
            }
            Some('%') => {
                chars.next();
                out.push('%');
                continue;
            }
            _ => None,
        };

        let source = match chars.next() {
            Some('m') => request.model.as_str(),
            Some('l') => request.layout.as_str(),
            Some('v') => request.variant(),
            other => {
                // Not an expansion; keep it as written
                out.push('%');
                out.extend(prefix);
                out.extend(other);
                continue;
            }
        };

        // Optional [N] index; only the first group exists here
        let mut first_group = true;
        if chars.peek() == Some(&'[') {
            chars.next();
            let index: String = chars.by_ref().take_while(|c| *c != ']').collect();
            first_group = matches!(index.trim(), "1" | "first");
        }

        if prefix == Some('(') && chars.peek() == Some(&')') {
            chars.next();
        }

        if source.is_empty() || !first_group {
            continue;
        }
        match prefix {
            Some('(') => {
                out.push('(');
                out.push_str(source);
                out.push(')');
            }
            Some(p) => {
                out.push(p);
                out.push_str(source);
            }
            None => out.push_str(source),
        }
    }

    out
}
