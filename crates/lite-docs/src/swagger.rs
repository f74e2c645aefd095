//! Swagger UI page.
//!
//! The page loads Swagger UI from a CDN and points it at the YAML document
//! URL, so the UI always shows exactly what the YAML endpoint serves.

/// Default URL of the UI page.
pub const DEFAULT_SWAGGER_URL: &str = "/swagger";

/// Default URL of the YAML document.
pub const DEFAULT_YAML_URL: &str = "/swagger/openapi.yaml";

/// Document expansion level for Swagger UI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DocExpansion {
    /// Show all operations collapsed.
    None,
    /// Show only the list of operations.
    #[default]
    List,
    /// Expand all operations fully.
    Full,
}

impl DocExpansion {
    const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::List => "list",
            Self::Full => "full",
        }
    }
}

/// Swagger UI configuration and HTML generation.
#[derive(Debug, Clone)]
pub struct SwaggerUi {
    /// URL of the YAML document.
    yaml_url: String,
    /// Title for the HTML page.
    title: String,
    /// Default expansion depth for operations.
    doc_expansion: DocExpansion,
    /// Swagger UI version to use from CDN.
    swagger_version: String,
}

impl SwaggerUi {
    /// Creates a page for the document served at `yaml_url`.
    #[must_use]
    pub fn new(yaml_url: impl Into<String>, api_title: &str) -> Self {
        Self {
            yaml_url: yaml_url.into(),
            title: format!("{api_title} - Swagger UI"),
            doc_expansion: DocExpansion::List,
            swagger_version: "5.18.2".to_string(),
        }
    }

    /// Set the page title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the document expansion level.
    #[must_use]
    pub fn doc_expansion(mut self, expansion: DocExpansion) -> Self {
        self.doc_expansion = expansion;
        self
    }

    /// Set the Swagger UI version to use.
    #[must_use]
    pub fn swagger_version(mut self, version: impl Into<String>) -> Self {
        self.swagger_version = version.into();
        self
    }

    /// URL of the YAML document.
    #[must_use]
    pub fn yaml_url(&self) -> &str {
        &self.yaml_url
    }

    /// Renders the page.
    #[must_use]
    pub fn html(&self) -> String {
        format!(
            r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@{version}/swagger-ui.css" />
    <style>
        html {{
            box-sizing: border-box;
            overflow-y: scroll;
        }}
        body {{
            margin: 0;
            background: #fafafa;
        }}
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@{version}/swagger-ui-bundle.js"></script>
    <script src="https://unpkg.com/swagger-ui-dist@{version}/swagger-ui-standalone-preset.js"></script>
    <script>
        window.onload = function() {{
            window.ui = SwaggerUIBundle({{
                url: '{url}',
                dom_id: '#swagger-ui',
                deepLinking: true,
                docExpansion: '{expansion}',
                presets: [
                    SwaggerUIBundle.presets.apis,
                    SwaggerUIStandalonePreset
                ],
                layout: 'StandaloneLayout'
            }});
        }};
    </script>
</body>
</html>"##,
            title = escape_html(&self.title),
            version = self.swagger_version,
            url = self.yaml_url.replace('\'', "%27"),
            expansion = self.doc_expansion.as_str(),
        )
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
