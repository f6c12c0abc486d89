//! Markdown extensions selectable by name.

use comrak::Options;
use std::str::FromStr;

use crate::Error;

/// Prefix accepted in front of extension names, as in `markdown.extensions.tables`.
const QUALIFIED_PREFIX: &str = "markdown.extensions.";

/// Optional markdown syntax enabled per render.
///
/// Names follow the vocabulary existing configuration files use (`tables`,
/// `footnotes`, `def_list`, ...). Extensions that CommonMark already covers
/// are accepted and change nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    Tables,
    FencedCode,
    Footnotes,
    DefList,
    Smarty,
    Nl2Br,
    Toc,
    SaneLists,
    Strikethrough,
    Tasklist,
    Superscript,
    Autolink,
    Extra,
    CodeHilite,
}

impl Extension {
    /// Returns the canonical extension name.
    pub fn name(&self) -> &'static str {
        match self {
            Extension::Tables => "tables",
            Extension::FencedCode => "fenced_code",
            Extension::Footnotes => "footnotes",
            Extension::DefList => "def_list",
            Extension::Smarty => "smarty",
            Extension::Nl2Br => "nl2br",
            Extension::Toc => "toc",
            Extension::SaneLists => "sane_lists",
            Extension::Strikethrough => "strikethrough",
            Extension::Tasklist => "tasklist",
            Extension::Superscript => "superscript",
            Extension::Autolink => "autolink",
            Extension::Extra => "extra",
            Extension::CodeHilite => "codehilite",
        }
    }

    /// Enables this extension on comrak options.
    ///
    /// `codehilite` has no parser counterpart; the renderer handles it after
    /// HTML generation.
    pub fn apply(&self, options: &mut Options<'_>) {
        match self {
            Extension::Tables => options.extension.table = true,
            Extension::Footnotes => options.extension.footnotes = true,
            Extension::DefList => options.extension.description_lists = true,
            Extension::Smarty => options.parse.smart = true,
            Extension::Nl2Br => options.render.hardbreaks = true,
            Extension::Toc => options.extension.header_ids = Some(String::new()),
            Extension::Strikethrough => options.extension.strikethrough = true,
            Extension::Tasklist => options.extension.tasklist = true,
            Extension::Superscript => options.extension.superscript = true,
            Extension::Autolink => options.extension.autolink = true,
            Extension::Extra => {
                for extension in [Extension::Tables, Extension::Footnotes, Extension::DefList] {
                    extension.apply(options);
                }
            }
            Extension::FencedCode | Extension::SaneLists | Extension::CodeHilite => {}
        }
    }
}

impl FromStr for Extension {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let short = name.strip_prefix(QUALIFIED_PREFIX).unwrap_or(name);

        let extension = match short {
            "tables" => Extension::Tables,
            "fenced_code" => Extension::FencedCode,
            "footnotes" => Extension::Footnotes,
            "def_list" => Extension::DefList,
            "smarty" => Extension::Smarty,
            "nl2br" => Extension::Nl2Br,
            "toc" => Extension::Toc,
            "sane_lists" => Extension::SaneLists,
            "strikethrough" => Extension::Strikethrough,
            "tasklist" => Extension::Tasklist,
            "superscript" => Extension::Superscript,
            "autolink" => Extension::Autolink,
            "extra" => Extension::Extra,
            "codehilite" => Extension::CodeHilite,
            _ => return Err(Error::UnknownExtension(name.to_string())),
        };

        Ok(extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_name() {
        // Arrange & Act
        let extension: Extension = "tables".parse().expect("Should parse");

        // Assert
        assert_eq!(extension, Extension::Tables);
        assert_eq!(extension.name(), "tables");
    }

    #[test]
    fn test_parse_qualified_name() {
        // Arrange & Act
        let extension: Extension = "markdown.extensions.def_list"
            .parse()
            .expect("Should parse qualified name");

        // Assert
        assert_eq!(extension, Extension::DefList);
    }

    #[test]
    fn test_parse_unknown_name() {
        // Arrange & Act
        let result = "nonexistent".parse::<Extension>();

        // Assert
        match result {
            Err(Error::UnknownExtension(name)) => assert_eq!(name, "nonexistent"),
            other => panic!("Expected unknown extension error, got {:?}", other),
        }
    }

    #[test]
    fn test_apply_tables() {
        // Arrange
        let mut options = Options::default();

        // Act
        Extension::Tables.apply(&mut options);

        // Assert
        assert!(options.extension.table, "Table extension should be enabled");
        assert!(!options.extension.footnotes, "Other extensions untouched");
    }

    #[test]
    fn test_apply_extra_enables_bundle() {
        // Arrange
        let mut options = Options::default();

        // Act
        Extension::Extra.apply(&mut options);

        // Assert
        assert!(options.extension.table);
        assert!(options.extension.footnotes);
        assert!(options.extension.description_lists);
    }

    #[test]
    fn test_apply_noop_extensions() {
        // Arrange
        let mut options = Options::default();

        // Act
        Extension::FencedCode.apply(&mut options);
        Extension::CodeHilite.apply(&mut options);

        // Assert
        assert!(!options.extension.table);
        assert!(!options.parse.smart);
    }
}
