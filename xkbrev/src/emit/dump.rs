use std::io::Write;
use xkbrev_core::{LayoutModel, XkbError};

/// Plain listing of a compiled layout, one key per line
pub struct DumpWriter<W: Write> {
    writer: W,
}

impl<W: Write> DumpWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_model(mut self, model: &LayoutModel) -> Result<(), XkbError> {
        writeln!(self.writer, "# symbols: {}", model.symbols)?;
        if let Some(description) = &model.description {
            writeln!(self.writer, "# description: {}", description)?;
        }
        writeln!(self.writer, "# keys: {}", model.keys.len())?;

        for key in model.keys.values() {
            let levels: Vec<&str> = key
                .levels
                .iter()
                .map(|level| level.as_deref().unwrap_or("NoSymbol"))
                .collect();
            writeln!(
                self.writer,
                "<{}> {} [{}]",
                key.name,
                key.type_name,
                levels.join(", ")
            )?;
        }

        for (modifier, entries) in &model.modifier_map {
            writeln!(self.writer, "modifier_map {} {{ {} }}", modifier, entries.join(", "))?;
        }

        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use xkbrev_core::Key;

    #[test]
    fn test_dump_listing() {
        let mut model = LayoutModel {
            symbols: "pc+us".to_string(),
            description: Some("English (US)".to_string()),
            ..LayoutModel::default()
        };
        model.keys.insert(
            "AE01".into(),
            Key {
                name: "AE01".into(),
                type_name: "FOUR_LEVEL".into(),
                levels: vec![Some("1".into()), Some("exclam".into()), None, Some("exclamdown".into())],
            },
        );
        model
            .modifier_map
            .insert("Mod5".into(), vec!["<LVL3>".into(), "<MDSW>".into()]);

        let mut out = Vec::new();
        DumpWriter::new(&mut out).write_model(&model).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "# symbols: pc+us\n\
             # description: English (US)\n\
             # keys: 1\n\
             <AE01> FOUR_LEVEL [1, exclam, NoSymbol, exclamdown]\n\
             modifier_map Mod5 { <LVL3>, <MDSW> }\n"
        );
    }
}
