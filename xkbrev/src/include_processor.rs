use crate::database::DatabasePaths;
use crate::parser::{MergeMode, Parser, Section, SectionKind, Statement, StatementKind, XkbFile};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use xkbrev_core::XkbError;

/// One `file(section):group` part of a component expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeRef {
    /// `None` for a leading part without operator; it takes the caller's mode
    pub merge: Option<MergeMode>,
    pub file: String,
    pub section: Option<String>,
    pub group: Option<u32>,
}

/// Split `pc+us(dvp):1|ctrl(nocaps)` into its parts
pub fn parse_component_expr(expr: &str) -> Result<Vec<IncludeRef>, String> {
    let mut refs = Vec::new();
    let mut rest = expr.trim();

    loop {
        let mut merge = None;
        if let Some(tail) = rest.strip_prefix('+') {
            merge = Some(MergeMode::Override);
            rest = tail;
        } else if let Some(tail) = rest.strip_prefix('|') {
            merge = Some(MergeMode::Augment);
            rest = tail;
        }

        let end = rest.find(['+', '|']).unwrap_or(rest.len());
        refs.push(parse_ref(&rest[..end], merge, expr)?);

        if end == rest.len() {
            return Ok(refs);
        }
        rest = &rest[end..];
    }
}

fn parse_ref(part: &str, merge: Option<MergeMode>, expr: &str) -> Result<IncludeRef, String> {
    let part = part.trim();
    let name_end = part.find(['(', ':']).unwrap_or(part.len());
    let file = &part[..name_end];
    if file.is_empty() {
        return Err(format!("Empty component in '{}'", expr));
    }

    let mut rest = &part[name_end..];
    let mut section = None;
    if let Some(tail) = rest.strip_prefix('(') {
        let close = tail
            .find(')')
            .ok_or_else(|| format!("Unterminated section name in '{}'", expr))?;
        section = Some(tail[..close].to_string());
        rest = &tail[close + 1..];
    }

    let group = match rest.strip_prefix(':') {
        Some(index) => Some(
            index
                .parse::<u32>()
                .map_err(|_| format!("Invalid group index '{}' in '{}'", index, expr))?,
        ),
        None if rest.is_empty() => None,
        None => return Err(format!("Unexpected '{}' in '{}'", rest, expr)),
    };

    Ok(IncludeRef {
        merge,
        file: file.to_string(),
        section,
        group,
    })
}

/// Compiles the statements of one kind of section into an info value
pub trait SectionCompiler {
    const KIND: SectionKind;
    type Info: Default;

    /// Handle every statement except includes
    fn statement(
        &mut self,
        info: &mut Self::Info,
        statement: &Statement,
        merge: MergeMode,
        file: &str,
    ) -> Result<(), XkbError>;

    /// Fold an included info into `into`
    fn merge(&mut self, into: &mut Self::Info, from: Self::Info, mode: MergeMode);
}

/// Resolves component expressions and include statements against the
/// database tree
pub struct IncludeProcessor {
    paths: DatabasePaths,
    /// Parsed files, keyed by path
    cache: HashMap<PathBuf, Rc<XkbFile>>,
    /// Sections being compiled, to detect circular includes
    stack: Vec<String>,
}

impl IncludeProcessor {
    pub fn new(paths: &DatabasePaths) -> Self {
        Self {
            paths: paths.clone(),
            cache: HashMap::new(),
            stack: Vec::new(),
        }
    }

    /// Compile a component expression from the rules
    pub fn compile<C: SectionCompiler>(&mut self, compiler: &mut C, expr: &str) -> Result<C::Info, XkbError> {
        log::debug!("Compiling {} from '{}'", C::KIND.dir(), expr);
        self.compile_expr(compiler, expr, MergeMode::Override, expr, 0)
    }

    fn compile_expr<C: SectionCompiler>(
        &mut self,
        compiler: &mut C,
        expr: &str,
        mode: MergeMode,
        origin: &str,
        line: usize,
    ) -> Result<C::Info, XkbError> {
        let refs = parse_component_expr(expr).map_err(|message| XkbError::parse(origin, line, message))?;

        let mut info = C::Info::default();
        for reference in &refs {
            if let Some(group) = reference.group.filter(|g| *g > 1) {
                log::debug!("Ignoring {}:{}; only the first group is compiled", reference.file, group);
                continue;
            }
            let merge = reference.merge.unwrap_or(mode);
            let part = self.compile_ref(compiler, reference, merge, origin, line)?;
            compiler.merge(&mut info, part, merge);
        }
        Ok(info)
    }

    fn compile_ref<C: SectionCompiler>(
        &mut self,
        compiler: &mut C,
        reference: &IncludeRef,
        mode: MergeMode,
        origin: &str,
        line: usize,
    ) -> Result<C::Info, XkbError> {
        let file = self.load(C::KIND, &reference.file)?;
        let section = file
            .section(C::KIND, reference.section.as_deref())
            .ok_or_else(|| {
                let name = match &reference.section {
                    Some(section) => format!("{}/{}({})", C::KIND.dir(), reference.file, section),
                    None => format!("{}/{}", C::KIND.dir(), reference.file),
                };
                XkbError::not_found("section", name)
            })?;

        let label = format!("{}/{}({})", C::KIND.dir(), reference.file, section.name);
        if self.stack.contains(&label) {
            return Err(XkbError::parse(
                origin,
                line,
                format!("Circular include detected: {}", label),
            ));
        }

        self.stack.push(label);
        let result = self.compile_section(compiler, section, &file.name, mode);
        self.stack.pop();
        result
    }

    /// Compile one section; its statements default to `mode`
    pub fn compile_section<C: SectionCompiler>(
        &mut self,
        compiler: &mut C,
        section: &Section,
        file: &str,
        mode: MergeMode,
    ) -> Result<C::Info, XkbError> {
        let mut info = C::Info::default();

        for statement in &section.statements {
            let merge = match statement.merge {
                MergeMode::Default => mode,
                explicit => explicit,
            };
            match &statement.kind {
                StatementKind::Include(expr) => {
                    let included = self.compile_expr(compiler, expr, merge, file, statement.line)?;
                    compiler.merge(&mut info, included, merge);
                }
                _ => compiler.statement(&mut info, statement, merge, file)?,
            }
        }

        Ok(info)
    }

    fn load(&mut self, kind: SectionKind, name: &str) -> Result<Rc<XkbFile>, XkbError> {
        let path = self.paths.component_dir(kind).join(name);
        if let Some(file) = self.cache.get(&path) {
            return Ok(Rc::clone(file));
        }

        let mut content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(XkbError::not_found(kind.dir(), name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        // Strip UTF-8 BOM if present
        if content.starts_with('\u{FEFF}') {
            content = content.trim_start_matches('\u{FEFF}').to_string();
        }

        let label = format!("{}/{}", kind.dir(), name);
        let file = Rc::new(Parser::new(&content, &label).parse()?);
        log::debug!("Parsed {} ({} sections)", path.display(), file.sections.len());

        self.cache.insert(path, Rc::clone(&file));
        Ok(file)
    }
}
