//! HTML rendering of the field catalog.

use tera::{Context, Tera};

use crate::error::SerializeError;
use crate::registry::FieldInfo;

const CATALOG_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Tracked fields</title>
</head>
<body>
<h1>Tracked fields</h1>
<p>{{ fields | length }} registered fields.</p>
<table>
<tr><th>ID</th><th>Name</th><th>Type</th><th>Description</th></tr>
{% for field in fields -%}
<tr><td>{{ field.id }}</td><td>{{ field.name }}</td>
<td>{{ field.type }}</td><td>{{ field.description }}</td></tr>
{% endfor -%}
</table>
</body>
</html>
"#;

/// Render `fields` as an HTML table. Names and descriptions are escaped.
pub(crate) fn render(fields: &[FieldInfo]) -> Result<String, SerializeError> {
    let mut context = Context::new();
    context.insert("fields", fields);
    Ok(Tera::one_off(CATALOG_TEMPLATE, &context, true)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::FieldId;

    #[test]
    fn test_render_escapes() {
        let fields = vec![FieldInfo {
            id: FieldId(3),
            name: "dev.name".to_string(),
            description: "<script>alert(1)</script>".to_string(),
            type_name: "String",
        }];
        let html = render(&fields).unwrap();
        assert!(html.contains("<td>3</td><td>dev.name</td>"));
        assert!(html.contains("1 registered fields."));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
