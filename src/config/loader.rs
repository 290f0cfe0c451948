use std::path::Path;

use config::{Config, File, FileFormat};
use eyre::{Context, Result};

use crate::config::models::RouteDocument;

/// Document written by `routeforge init`.
pub const SAMPLE_DOCUMENT: &str = r#"# routeforge route document

settings:
  legacy_class: nginx
  controller: k8s.io/ingress-nginx
  deprecated_classes: [nginx]
  logging:
    level: info
    json: false

routes:
  - name: storefront
    namespace: shop
    host: shop.example.com
    service_name: web
    service_port: 8080
    presets:
      - type: tls
        secret: shop-tls
      - type: hsts
        max_age_secs: 31536000
        include_subdomains: true

  - name: api
    namespace: shop
    host: api.example.com
    path: /api
    service_name: api
    service_port: 9000
    policies:
      proxy-body-size: 8m
    presets:
      - type: path_rewrite
        target: /
      - type: canary
        service_name: api-next
        port: 9000
        weight: 20
      - type: rate_limit
        rps: 50
"#;

fn format_for(path: &Path) -> FileFormat {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => FileFormat::Yaml,
        Some("json") => FileFormat::Json,
        Some("toml") => FileFormat::Toml,
        Some("ini") => FileFormat::Ini,
        _ => FileFormat::Yaml, // Default to YAML
    }
}

/// Load a route document; the format is picked from the file extension.
pub fn load_document(document_path: &str) -> Result<RouteDocument> {
    let path = Path::new(document_path);

    let settings = Config::builder()
        .add_source(File::new(
            path.to_str()
                .ok_or_else(|| eyre::eyre!("Invalid UTF-8 path: {}", path.display()))?,
            format_for(path),
        ))
        .build()
        .with_context(|| format!("Failed to read route document {}", path.display()))?;

    let document: RouteDocument = settings
        .try_deserialize()
        .with_context(|| format!("Failed to deserialize route document {}", path.display()))?;

    tracing::debug!(
        document = %path.display(),
        routes = document.routes.len(),
        "loaded route document"
    );
    Ok(document)
}

/// Parse a document held in memory, e.g. [`SAMPLE_DOCUMENT`].
pub fn parse_document(content: &str, format: FileFormat) -> Result<RouteDocument> {
    Config::builder()
        .add_source(File::from_str(content, format))
        .build()
        .context("Failed to parse route document")?
        .try_deserialize()
        .context("Failed to deserialize route document")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::config::models::PresetConfig;

    #[test]
    fn test_load_yaml_document() {
        let yaml_content = r#"
routes:
  - name: storefront
    namespace: shop
    host: shop.example.com
    service_name: web
    service_port: 8080
    tls_secret: shop-tls
    presets:
      - type: websocket
"#;

        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        write!(temp_file, "{}", yaml_content).unwrap();

        let document = load_document(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(document.routes.len(), 1);
        assert_eq!(document.settings.legacy_class, "nginx");

        let spec = &document.routes[0];
        assert_eq!(spec.route.path, "/");
        assert_eq!(spec.route.tls_secret.as_deref(), Some("shop-tls"));
        assert_eq!(spec.presets, vec![PresetConfig::Websocket]);
    }

    #[test]
    fn test_load_json_document() {
        let json_content = r#"
{
  "settings": { "legacy_class": "edge" },
  "routes": [
    {
      "name": "api",
      "host": "api.example.com",
      "path": "/api",
      "service_name": "api",
      "service_port": 9000,
      "presets": [{ "type": "path_rewrite", "target": "/" }]
    }
  ]
}
"#;

        let mut temp_file = NamedTempFile::with_suffix(".json").unwrap();
        write!(temp_file, "{}", json_content).unwrap();

        let document = load_document(temp_file.path().to_str().unwrap()).unwrap();
        assert_eq!(document.settings.legacy_class, "edge");
        assert_eq!(document.routes[0].route.namespace, "default");

        let routes = document.compile().unwrap();
        assert_eq!(routes[0].path(), "/api(/|$)(.*)");
    }

    #[test]
    fn test_missing_document_fails() {
        assert!(load_document("/nonexistent/routes.yaml").is_err());
    }

    #[test]
    fn test_sample_document_compiles() {
        let document = parse_document(SAMPLE_DOCUMENT, FileFormat::Yaml).unwrap();
        assert_eq!(document.routes.len(), 2);

        let routes = document.compile().unwrap();
        assert_eq!(routes[0].tls.len(), 1);
        assert_eq!(routes[1].backends().len(), 2);
    }
}
