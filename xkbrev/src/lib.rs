pub mod compiler;
pub mod database;
pub mod emit;
pub mod include_processor;
pub mod keysymdef;
pub mod lexer;
pub mod parser;
pub mod rules;

pub use xkbrev_core::*;
pub use database::DatabasePaths;

use compiler::{build_model, KeycodesCompiler, SymbolsCompiler, TypesCompiler, TypesInfo};
use emit::{DumpWriter, XrdpWriter, XRDP_KEYCODES};
use include_processor::IncludeProcessor;
use rules::{Components, Rules};

// Symbols every pc layout pulls in; not worth reporting
const COMMON_SYMBOLS: [&str; 2] = ["pc", "inet(evdev)"];

const DEFAULT_MODEL: &str = "pc105";

/// Loads layouts from one Xkb database
pub struct Loader {
    rules: Rules,
    keysyms: KeysymTable,
    processor: IncludeProcessor,
}

impl Loader {
    /// Read the rules and keysym definitions; components are parsed lazily
    pub fn open(paths: &DatabasePaths) -> Result<Self> {
        let keysyms = keysymdef::read_keysymdef(&paths.keysymdef)?;
        let mut rules = Rules::from_file(&paths.rules_file())?;
        if let Some(models) = rules::read_model_list(&paths.rules_list_file())? {
            rules = rules.with_models(models);
        }
        Ok(Self {
            rules,
            keysyms,
            processor: IncludeProcessor::new(paths),
        })
    }

    pub fn keysyms(&self) -> &KeysymTable {
        &self.keysyms
    }

    pub fn components(&self, request: &LayoutRequest) -> Result<Components> {
        self.rules.resolve(request)
    }

    pub fn load(&mut self, request: &LayoutRequest) -> Result<LayoutModel> {
        let components = self.components(request)?;
        log::info!("Layout: {}", layout_summary(&components.symbols));
        log::debug!("Components: {:?}", components);

        let keycodes = self.keycodes(&components.keycodes)?;
        let types = if components.types.is_empty() {
            TypesInfo::default()
        } else {
            self.processor.compile(&mut TypesCompiler, &components.types)?
        };
        let symbols = self.processor.compile(&mut SymbolsCompiler, &components.symbols)?;

        let model = build_model(
            &components.symbols,
            symbols,
            &types.types,
            &keycodes,
            &self.keysyms,
        )?;
        log::debug!("{} keys, {} key types", model.keys.len(), model.types.len());
        Ok(model)
    }

    /// Compile a keycodes component expression such as `xfree86`
    pub fn keycodes(&mut self, expr: &str) -> Result<KeycodeMap> {
        let info = self.processor.compile(&mut KeycodesCompiler, expr)?;
        Ok(info.finish(expr))
    }
}

fn layout_summary(symbols: &str) -> String {
    symbols
        .split(['+', '|'])
        .filter(|part| !COMMON_SYMBOLS.contains(part))
        .collect::<Vec<_>>()
        .join("+")
}

/// Build a request from setxkbmap style arguments.
///
/// Each `options` entry may hold a comma-separated list; an empty entry
/// drops the options given before it.
pub fn layout_request(
    model: Option<&str>,
    layout: &str,
    variant: Option<&str>,
    options: &[String],
) -> Result<LayoutRequest> {
    let layout = layout.trim();
    if layout.is_empty() {
        return Err(XkbError::Input("No layout given".to_string()));
    }
    if layout.contains(',') {
        return Err(XkbError::Input(format!(
            "Only a single layout is supported, got '{}'",
            layout
        )));
    }

    let model = model.map(str::trim).filter(|m| !m.is_empty()).unwrap_or(DEFAULT_MODEL);
    let mut request = LayoutRequest::new(model, layout);

    if let Some(variant) = variant.map(str::trim).filter(|v| !v.is_empty()) {
        if variant.contains(',') {
            return Err(XkbError::Input(format!(
                "Only a single variant is supported, got '{}'",
                variant
            )));
        }
        request = request.with_variant(variant);
    }

    for entry in options {
        if entry.trim().is_empty() {
            request.options.clear();
            continue;
        }
        for option in entry.split(',').map(str::trim).filter(|o| !o.is_empty()) {
            if request.options.iter().any(|o| o == option) {
                log::debug!("Option {} given more than once", option);
                continue;
            }
            request = request.with_option(option);
        }
    }

    Ok(request)
}

/// Load `request` and render it in `format`.
///
/// The document is built in memory so a failure leaves nothing behind.
pub fn generate(paths: &DatabasePaths, request: &LayoutRequest, format: OutputFormat) -> Result<Vec<u8>> {
    let mut loader = Loader::open(paths)?;
    let model = loader.load(request)?;

    let mut out = Vec::new();
    match format {
        OutputFormat::Xrdp => {
            let keycodes = loader.keycodes(XRDP_KEYCODES)?;
            XrdpWriter::new(&mut out).write_keymap(&model, &keycodes, loader.keysyms())?;
        }
        OutputFormat::Dump => DumpWriter::new(&mut out).write_model(&model)?,
    }
    Ok(out)
}
