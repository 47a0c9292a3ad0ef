//! Report template registry.
//!
//! Seeded with built-in templates; operators can add or replace templates
//! through a YAML file loaded at startup, and callers can register new ones
//! at runtime. Every registered template has passed section validation and
//! holds its sections sorted by `order`.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::error::ReportError;
use crate::types::{ReportFormat, ReportSection, ReportTemplate, SectionKind, TemplateDefinition};

pub struct TemplateRegistry {
    templates: RwLock<HashMap<String, ReportTemplate>>,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl TemplateRegistry {
    /// Creates a registry holding the built-in templates.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut templates = HashMap::new();
        for template in builtin_templates() {
            templates.insert(template.id.clone(), template);
        }
        Self {
            templates: RwLock::new(templates),
        }
    }

    fn read_templates(&self) -> RwLockReadGuard<'_, HashMap<String, ReportTemplate>> {
        self.templates
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_templates(&self) -> RwLockWriteGuard<'_, HashMap<String, ReportTemplate>> {
        self.templates
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads templates from a YAML file and registers them, replacing any
    /// existing template with the same id (including built-ins). The file is
    /// validated in full before anything is registered, so a bad file leaves
    /// the registry untouched. Returns how many templates were loaded.
    ///
    /// # Errors
    ///
    /// - [`ReportError::TemplateIo`] if the file cannot be read.
    /// - [`ReportError::TemplateParse`] if it is not valid YAML of the
    ///   expected shape.
    /// - [`ReportError::InvalidTemplate`] if a template repeats an id within
    ///   the file or fails section validation.
    pub fn load_yaml(&self, path: &Path) -> Result<usize, ReportError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ReportError::TemplateIo {
            path: path.display().to_string(),
            source: e,
        })?;
        let extras: Vec<ReportTemplate> =
            serde_yaml::from_str(&raw).map_err(|e| ReportError::TemplateParse {
                path: path.display().to_string(),
                source: e,
            })?;

        let mut seen = HashSet::new();
        let mut prepared = Vec::with_capacity(extras.len());
        for mut template in extras {
            if template.id.trim().is_empty() {
                return Err(ReportError::InvalidTemplate(
                    "file template is missing an id".to_owned(),
                ));
            }
            if !seen.insert(template.id.clone()) {
                return Err(ReportError::InvalidTemplate(format!(
                    "file repeats template id '{}'",
                    template.id
                )));
            }
            validate_sections(&template.name, &template.sections)?;
            template.sections.sort_by_key(|s| s.order);
            prepared.push(template);
        }

        let loaded = prepared.len();
        let mut templates = self.write_templates();
        for template in prepared {
            templates.insert(template.id.clone(), template);
        }
        Ok(loaded)
    }

    /// Registers a new template from a caller-supplied definition and
    /// returns it with a fresh unique id. The definition itself is never
    /// mutated.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidTemplate`] when the definition repeats
    /// a section id or an `order` value, or a section id is empty.
    pub fn create_template(
        &self,
        definition: &TemplateDefinition,
    ) -> Result<ReportTemplate, ReportError> {
        validate_sections(&definition.name, &definition.sections)?;

        let mut sections = definition.sections.clone();
        sections.sort_by_key(|s| s.order);
        let template = ReportTemplate {
            id: Uuid::new_v4().to_string(),
            name: definition.name.clone(),
            kind: definition.kind.clone(),
            sections,
            output_format: definition.output_format,
        };

        self.write_templates()
            .insert(template.id.clone(), template.clone());
        Ok(template)
    }

    #[must_use]
    pub fn get_template(&self, id: &str) -> Option<ReportTemplate> {
        self.read_templates().get(id).cloned()
    }

    /// Every registered template, sorted by id.
    #[must_use]
    pub fn list_templates(&self) -> Vec<ReportTemplate> {
        let mut templates: Vec<ReportTemplate> = self.read_templates().values().cloned().collect();
        templates.sort_by(|a, b| a.id.cmp(&b.id));
        templates
    }
}

/// Section ids and `order` values must each be unique: ids key the collected
/// data, and `order` must induce a total order for rendering.
fn validate_sections(name: &str, sections: &[ReportSection]) -> Result<(), ReportError> {
    let mut ids = HashSet::new();
    let mut orders = HashSet::new();
    for section in sections {
        if section.id.trim().is_empty() {
            return Err(ReportError::InvalidTemplate(format!(
                "template '{name}' has a section with an empty id"
            )));
        }
        if !ids.insert(section.id.as_str()) {
            return Err(ReportError::InvalidTemplate(format!(
                "template '{name}' repeats section id '{}'",
                section.id
            )));
        }
        if !orders.insert(section.order) {
            return Err(ReportError::InvalidTemplate(format!(
                "template '{name}' repeats section order {}",
                section.order
            )));
        }
    }
    Ok(())
}

fn section(
    id: &str,
    title: &str,
    kind: SectionKind,
    data_source: &str,
    order: u32,
) -> ReportSection {
    ReportSection {
        id: id.to_owned(),
        title: title.to_owned(),
        kind,
        data_source: data_source.to_owned(),
        config: serde_json::Value::Null,
        order,
    }
}

fn builtin_templates() -> Vec<ReportTemplate> {
    vec![
        ReportTemplate {
            id: "executive-summary".to_owned(),
            name: "Executive Summary".to_owned(),
            kind: "summary".to_owned(),
            output_format: ReportFormat::Pdf,
            sections: vec![
                section("overview", "Quality Overview", SectionKind::Kpi, "content", 1),
                section("trend", "Quality Trend", SectionKind::Chart, "analytics", 2),
                section("highlights", "Highlights", SectionKind::Text, "custom", 3),
            ],
        },
        ReportTemplate {
            id: "content-quality".to_owned(),
            name: "Content Quality".to_owned(),
            kind: "quality".to_owned(),
            output_format: ReportFormat::Excel,
            sections: vec![
                section("scores", "Aggregate Scores", SectionKind::Metrics, "content", 1),
                section("breakdown", "Daily Breakdown", SectionKind::Table, "analytics", 2),
                section("trend", "Trend", SectionKind::Trend, "analytics", 3),
            ],
        },
        ReportTemplate {
            id: "link-health".to_owned(),
            name: "Link Health".to_owned(),
            kind: "links".to_owned(),
            output_format: ReportFormat::Csv,
            sections: vec![
                section("status", "Link Status", SectionKind::Table, "links", 1),
                section("notes", "Notes", SectionKind::Text, "custom", 2),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(sections: Vec<ReportSection>) -> TemplateDefinition {
        TemplateDefinition {
            name: "Weekly Digest".to_owned(),
            kind: "summary".to_owned(),
            sections,
            output_format: ReportFormat::Json,
        }
    }

    #[test]
    fn builtins_are_registered_and_listed_sorted() {
        let registry = TemplateRegistry::with_builtins();
        let templates = registry.list_templates();
        let ids: Vec<&str> = templates.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["content-quality", "executive-summary", "link-health"]);
        assert!(registry.get_template("executive-summary").is_some());
        assert!(registry.get_template("nope").is_none());
    }

    #[test]
    fn create_assigns_a_fresh_id_and_sorts_sections() {
        let registry = TemplateRegistry::with_builtins();
        let def = definition(vec![
            section("late", "Late", SectionKind::Text, "custom", 9),
            section("early", "Early", SectionKind::Kpi, "content", 2),
        ]);

        let created = registry
            .create_template(&def)
            .expect("template should be valid");

        assert!(Uuid::parse_str(&created.id).is_ok(), "id should be a uuid");
        assert_eq!(created.sections[0].id, "early");
        assert_eq!(created.sections[1].id, "late");
        // The caller's definition keeps its original section order.
        assert_eq!(def.sections[0].id, "late");
        assert!(registry.get_template(&created.id).is_some());
    }

    #[test]
    fn duplicate_section_ids_are_rejected() {
        let registry = TemplateRegistry::with_builtins();
        let def = definition(vec![
            section("a", "A", SectionKind::Text, "custom", 1),
            section("a", "A again", SectionKind::Text, "custom", 2),
        ]);
        let result = registry.create_template(&def);
        assert!(matches!(result, Err(ReportError::InvalidTemplate(_))));
    }

    #[test]
    fn duplicate_section_orders_are_rejected() {
        let registry = TemplateRegistry::with_builtins();
        let def = definition(vec![
            section("a", "A", SectionKind::Text, "custom", 1),
            section("b", "B", SectionKind::Text, "custom", 1),
        ]);
        let result = registry.create_template(&def);
        assert!(matches!(result, Err(ReportError::InvalidTemplate(_))));
    }

    #[test]
    fn yaml_file_adds_and_replaces_templates() {
        let dir = std::env::temp_dir().join(format!("cqrd-templates-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("templates.yaml");
        std::fs::write(
            &path,
            r#"
- id: site-audit
  name: Site Audit
  type: audit
  output_format: json
  sections:
    - id: links
      title: Links
      type: table
      data_source: links
      config:
        urls: ["https://x.test/"]
      order: 1
- id: link-health
  name: Custom Link Health
  type: links
  output_format: json
  sections:
    - id: status
      title: Status
      type: table
      data_source: links
      order: 1
"#,
        )
        .expect("write yaml");

        let registry = TemplateRegistry::with_builtins();
        let loaded = registry.load_yaml(&path).expect("yaml should load");
        assert_eq!(loaded, 2);
        assert!(registry.get_template("site-audit").is_some());
        let replaced = registry
            .get_template("link-health")
            .expect("replaced builtin");
        assert_eq!(replaced.name, "Custom Link Health");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn invalid_yaml_file_leaves_registry_untouched() {
        let dir = std::env::temp_dir().join(format!("cqrd-templates-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join("templates.yaml");
        std::fs::write(
            &path,
            r#"
- id: broken
  name: Broken
  type: audit
  output_format: json
  sections:
    - id: dup
      title: One
      type: text
      data_source: custom
      order: 1
    - id: dup
      title: Two
      type: text
      data_source: custom
      order: 2
"#,
        )
        .expect("write yaml");

        let registry = TemplateRegistry::with_builtins();
        let result = registry.load_yaml(&path);
        assert!(matches!(result, Err(ReportError::InvalidTemplate(_))));
        assert!(registry.get_template("broken").is_none());
        assert_eq!(registry.list_templates().len(), 3);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_yaml_file_is_an_io_error() {
        let registry = TemplateRegistry::with_builtins();
        let result = registry.load_yaml(Path::new("/definitely/not/here.yaml"));
        assert!(matches!(result, Err(ReportError::TemplateIo { .. })));
    }
}
