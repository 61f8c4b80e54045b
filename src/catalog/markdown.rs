//! Markdown export for a single entity

use super::{Catalog, CatalogError};
use crate::schema::EntityDescriptor;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// Render an entity as Markdown. Section order is fixed:
/// Keys, Properties, Navigation Properties.
pub fn render_entity(entity: &EntityDescriptor) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# {}\n", entity.name);

    output.push_str("## Keys\n\n");
    if entity.keys.is_empty() {
        output.push_str("_None_\n");
    } else {
        for key in &entity.keys {
            let _ = writeln!(output, "- {}", key);
        }
    }
    output.push('\n');

    let _ = writeln!(output, "## Properties ({})\n", entity.properties.len());
    if entity.properties.is_empty() {
        output.push_str("_None_\n");
    } else {
        output.push_str("| Name | Type | Nullable | Annotations |\n");
        output.push_str("| --- | --- | --- | --- |\n");
        for prop in &entity.properties {
            let annotations = prop
                .annotations
                .iter()
                .map(|a| {
                    if a.value.is_empty() {
                        a.term.clone()
                    } else {
                        format!("{} = {}", a.term, a.value)
                    }
                })
                .collect::<Vec<_>>()
                .join("<br>");
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} |",
                cell(&prop.name),
                cell(&prop.type_name),
                if prop.nullable { "yes" } else { "no" },
                cell(&annotations)
            );
        }
    }
    output.push('\n');

    let _ = writeln!(
        output,
        "## Navigation Properties ({})\n",
        entity.navigation_properties.len()
    );
    if entity.navigation_properties.is_empty() {
        output.push_str("_None_\n");
    } else {
        output.push_str("| Name | Type |\n");
        output.push_str("| --- | --- |\n");
        for nav in &entity.navigation_properties {
            let _ = writeln!(output, "| {} | {} |", cell(&nav.name), cell(&nav.type_name));
        }
    }

    output
}

/// Write the Markdown for `name` to `output` (default `<name>.md`) and
/// return the path written
pub fn export_entity(
    catalog: &Catalog,
    name: &str,
    output: Option<&Path>,
) -> Result<PathBuf, CatalogError> {
    let entity = catalog.get(name)?;
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(format!("{}.md", entity.name)));

    let io_err = |source| CatalogError::Io {
        path: path.clone(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(&path, render_entity(entity)).map_err(io_err)?;

    tracing::info!("Exported {} to {}", entity.name, path.display());
    Ok(path)
}

/// Table cells stay on one line
fn cell(text: &str) -> String {
    text.replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace(['\n', '\r'], "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AnnotationDescriptor, Metadata, NavigationDescriptor, PropertyDescriptor};

    fn account() -> EntityDescriptor {
        EntityDescriptor {
            name: "account".to_string(),
            keys: vec!["accountid".to_string()],
            properties: vec![
                PropertyDescriptor {
                    name: "accountid".to_string(),
                    type_name: "Edm.Guid".to_string(),
                    nullable: false,
                    annotations: vec![],
                },
                PropertyDescriptor {
                    name: "name".to_string(),
                    type_name: "Edm.String".to_string(),
                    nullable: true,
                    annotations: vec![AnnotationDescriptor {
                        term: "Org.OData.Core.V1.Description".to_string(),
                        value: "Company | name".to_string(),
                    }],
                },
            ],
            navigation_properties: vec![NavigationDescriptor {
                name: "primarycontactid".to_string(),
                type_name: "Microsoft.Dynamics.CRM.contact".to_string(),
            }],
        }
    }

    #[test]
    fn test_render_section_order() {
        let md = render_entity(&account());

        let keys = md.find("## Keys").unwrap();
        let props = md.find("## Properties").unwrap();
        let navs = md.find("## Navigation Properties").unwrap();
        assert!(md.starts_with("# account\n"));
        assert!(keys < props && props < navs);

        assert!(md.contains("- accountid\n"));
        assert!(md.contains("| name | Edm.String | yes | Org.OData.Core.V1.Description = Company \\| name |"));
        assert!(md.contains("| primarycontactid | Microsoft.Dynamics.CRM.contact |"));
    }

    #[test]
    fn test_render_multiline_cells_stay_in_row() {
        let mut entity = account();
        entity.properties[1].annotations[0].value = "First line\nsecond\r\nthird".to_string();

        let md = render_entity(&entity);
        assert!(md.contains(
            "| name | Edm.String | yes | Org.OData.Core.V1.Description = First line<br>second<br>third |\n"
        ));
        let rows = md.lines().filter(|l| l.starts_with("| name ")).count();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_render_empty_sections() {
        let md = render_entity(&EntityDescriptor {
            name: "empty".to_string(),
            ..Default::default()
        });
        assert_eq!(md.matches("_None_").count(), 3);
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::from_metadata(Metadata {
            entities: vec![account()],
        });
        let out = dir.path().join("docs/account.md");

        let written = export_entity(&catalog, "ACCOUNT", Some(out.as_path())).unwrap();
        assert_eq!(written, out);
        assert_eq!(fs::read_to_string(&out).unwrap(), render_entity(&account()));
    }

    #[test]
    fn test_export_unknown_entity() {
        let catalog = Catalog::from_metadata(Metadata::default());
        let err = export_entity(&catalog, "xyz", None).unwrap_err();
        assert!(matches!(err, CatalogError::EntityNotFound(_)));
    }
}
