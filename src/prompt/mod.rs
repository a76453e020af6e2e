pub mod defaults;

use crate::error::TemplateError;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

/// The prompt templates one run needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    Extract,
    Bullets,
    Extend,
    Intro,
    Conclusion,
    Summarize,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 6] = [
        TemplateKind::Extract,
        TemplateKind::Bullets,
        TemplateKind::Extend,
        TemplateKind::Intro,
        TemplateKind::Conclusion,
        TemplateKind::Summarize,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            TemplateKind::Extract => "prompt_extract.txt",
            TemplateKind::Bullets => "prompt_bullets.txt",
            TemplateKind::Extend => "prompt_extend_w_data.txt",
            TemplateKind::Intro => "prompt_intro.txt",
            TemplateKind::Conclusion => "prompt_conclusion.txt",
            TemplateKind::Summarize => "prompt_summarize.txt",
        }
    }

    pub fn builtin(&self) -> &'static str {
        match self {
            TemplateKind::Extract => defaults::EXTRACT,
            TemplateKind::Bullets => defaults::BULLETS,
            TemplateKind::Extend => defaults::EXTEND,
            TemplateKind::Intro => defaults::INTRO,
            TemplateKind::Conclusion => defaults::CONCLUSION,
            TemplateKind::Summarize => defaults::SUMMARIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Templates {
    texts: HashMap<TemplateKind, String>,
}

impl Templates {
    /// Load every template from `dir`. A missing file is fatal.
    pub fn load(dir: &Path) -> Result<Self, TemplateError> {
        let mut texts = HashMap::new();
        for kind in TemplateKind::ALL {
            let path = dir.join(kind.file_name());
            let text = std::fs::read_to_string(&path)
                .map_err(|source| TemplateError::Read { path, source })?;
            debug!("Loaded template {} ({} bytes)", kind.file_name(), text.len());
            texts.insert(kind, text);
        }
        Ok(Self { texts })
    }

    /// Templates compiled into the binary
    pub fn builtin() -> Self {
        let texts = TemplateKind::ALL
            .iter()
            .map(|kind| (*kind, kind.builtin().to_string()))
            .collect();
        Self { texts }
    }

    pub fn render(
        &self,
        kind: TemplateKind,
        values: &[(&str, &str)],
    ) -> Result<String, TemplateError> {
        let template = self
            .texts
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.builtin());
        render(kind.file_name(), template, values)
    }
}

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex is valid")
    })
}

/// Substitute `{name}` placeholders. `{{` and `}}` produce literal braces.
pub fn render(name: &str, template: &str, values: &[(&str, &str)]) -> Result<String, TemplateError> {
    let re = placeholder_re();

    // Reject unknown placeholders before substituting anything
    for cap in re.captures_iter(template) {
        if let Some(key) = cap.get(1) {
            if !values.iter().any(|(k, _)| *k == key.as_str()) {
                return Err(TemplateError::UnknownPlaceholder {
                    template: name.to_string(),
                    name: key.as_str().to_string(),
                });
            }
        }
    }

    let rendered = re.replace_all(template, |cap: &Captures| match cap.get(1) {
        Some(key) => values
            .iter()
            .find(|(k, _)| *k == key.as_str())
            .map(|(_, v)| v.to_string())
            .unwrap_or_default(),
        None if &cap[0] == "{{" => "{".to_string(),
        None => "}".to_string(),
    });

    Ok(rendered.into_owned())
}
