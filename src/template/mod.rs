//! Template Renderer
//!
//! Documents are Jinja templates rendered with `minijinja`. Undefined values
//! fail when printed or iterated and are false in conditions. CloudFormation
//! dynamic references pass through as literal text. Rendering is pure
//! in-memory text production.

pub mod dynamic_refs;
pub mod error;

pub use error::RenderError;

use minijinja::{Environment, Template, UndefinedBehavior};
use serde_yaml::Value;

use crate::core::{RenderedDocument, TemplateDocument};
use crate::variables::Variables;

/// Name under which the whole variable mapping is also reachable
pub const VAR_NAMESPACE: &str = "var";

fn environment<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::SemiStrict);
    env.set_keep_trailing_newline(true);
    env
}

/// Render template text against `variables`
pub fn render_str(source: &str, variables: &Variables) -> Result<String, RenderError> {
    render_with_substitutions(source, variables).map(|(text, _)| text)
}

/// Render a template document
pub fn render(
    document: &TemplateDocument,
    variables: &Variables,
) -> Result<RenderedDocument, RenderError> {
    let (content, substitutions) = render_with_substitutions(&document.content, variables)?;
    log::debug!(
        "Rendered {} ({} substitutions)",
        document.path.display(),
        substitutions.len()
    );
    Ok(RenderedDocument {
        path: document.path.clone(),
        content,
        substitutions,
    })
}

fn render_with_substitutions(
    source: &str,
    variables: &Variables,
) -> Result<(String, Vec<String>), RenderError> {
    let source = dynamic_refs::protect(source);
    let env = environment();
    let template = env
        .template_from_str(&source)
        .map_err(|err| RenderError::from_engine(&err, &source))?;
    let content = template
        .render(context(variables))
        .map_err(|err| RenderError::from_engine(&err, &source))?;
    Ok((content, substitutions(&template, variables)))
}

/// Variables at top level plus the `var` namespace, unless a variable claims that name
fn context(variables: &Variables) -> minijinja::Value {
    let mut root = variables.mapping().clone();
    let namespace = Value::String(VAR_NAMESPACE.to_string());
    if !root.contains_key(&namespace) {
        root.insert(namespace, Value::Mapping(variables.mapping().clone()));
    }
    minijinja::Value::from_serialize(&root)
}

/// Defined variables the template refers to, as sorted dotted paths
fn substitutions(template: &Template<'_, '_>, variables: &Variables) -> Vec<String> {
    let mut used: Vec<String> = template
        .undeclared_variables(true)
        .into_iter()
        .filter(|path| {
            let root = path.split('.').next().unwrap_or_default();
            root == VAR_NAMESPACE || variables.get(root).is_some()
        })
        .collect();
    used.sort();
    used
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(yaml: &str) -> Variables {
        match serde_yaml::from_str(yaml).unwrap() {
            Value::Mapping(map) => Variables::from_mapping(map),
            _ => panic!("expected mapping"),
        }
    }

    #[test]
    fn substitution_and_record() {
        let doc = TemplateDocument::new("a.yaml", "Key: {{ val }} {{ other | default('x') }}");
        let rendered = render(&doc, &vars("val: 1")).unwrap();
        assert_eq!(rendered.content, "Key: 1 x");
        assert_eq!(rendered.substitutions, vec!["val".to_string()]);
    }

    #[test]
    fn var_namespace_and_top_level() {
        let v = vars("env: prod");
        assert_eq!(render_str("{{ var.env }}-{{ env }}", &v).unwrap(), "prod-prod");
    }

    #[test]
    fn variable_named_var_wins_over_namespace() {
        let v = vars("var: own\nenv: prod");
        assert_eq!(render_str("{{ var }}", &v).unwrap(), "own");
    }

    #[test]
    fn defaults_and_filters() {
        let v = vars("name: '  web  '");
        assert_eq!(render_str("{{ missing | default('x') }}", &v).unwrap(), "x");
        assert_eq!(render_str("{{ name | trim | upper }}", &v).unwrap(), "WEB");
        assert_eq!(
            render_str("{{ missing | default(name) | trim }}", &v).unwrap(),
            "web"
        );
    }

    #[test]
    fn conditions_treat_undefined_as_false() {
        let v = vars("prod: true\ncount: 0");
        let source = "{% if prod %}P{% else %}D{% endif %}{% if count %}C{% endif %}";
        assert_eq!(render_str(source, &v).unwrap(), "P");
        assert_eq!(
            render_str("{% if not undefined_flag %}yes{% endif %}", &v).unwrap(),
            "yes"
        );
        assert_eq!(
            render_str("{% if a %}A{% elif prod %}B{% endif %}", &v).unwrap(),
            "B"
        );
    }

    #[test]
    fn comparisons_tests_and_set() {
        let v = vars("env: prod\nreplicas: 3");
        let source = "{% set suffix = env | upper %}\
                      {% if var.env == 'prod' and replicas > 2 %}big-{{ suffix }}{% endif %}\
                      {% if region is defined %}R{% endif %}\
                      {% if env is defined or region %};ok{% endif %}";
        assert_eq!(render_str(source, &v).unwrap(), "big-PROD;ok");
    }

    #[test]
    fn loops_over_sequences_and_mappings() {
        let v = vars("subnets: [a, b]\ntags:\n  env: prod\n  team: core\n");
        assert_eq!(
            render_str("{% for s in subnets %}[{{ s }}]{% endfor %}", &v).unwrap(),
            "[a][b]"
        );
        assert_eq!(
            render_str("{% for k in tags %}{{ k }}={{ tags[k] }};{% endfor %}", &v).unwrap(),
            "env=prod;team=core;"
        );
    }

    #[test]
    fn whitespace_control_in_loops() {
        let v = vars("items: [1, 2]");
        let source = "list:\n{%- for i in items %}\n  - {{ i }}\n{%- endfor %}\n";
        assert_eq!(render_str(source, &v).unwrap(), "list:\n  - 1\n  - 2\n");
    }

    #[test]
    fn trailing_newline_is_kept() {
        assert_eq!(
            render_str("Resources: {}\n", &Variables::new()).unwrap(),
            "Resources: {}\n"
        );
    }

    #[test]
    fn undefined_variable_reports_line() {
        let err = render_str("a: 1\nb: {{ nope }}", &Variables::new()).unwrap_err();
        assert!(matches!(err, RenderError::UndefinedVariable { line: 2, .. }));
    }

    #[test]
    fn dynamic_references_are_literal() {
        let source = "Password: '{{resolve:ssm:/db/password}}'\nUser: {{ user }}\n";
        assert_eq!(
            render_str(source, &vars("user: admin")).unwrap(),
            "Password: '{{resolve:ssm:/db/password}}'\nUser: admin\n"
        );
    }

    #[test]
    fn tojson_filter() {
        let v = vars("ports: [80, 443]");
        assert_eq!(
            render_str("Ports: {{ ports | tojson }}", &v).unwrap(),
            "Ports: [80,443]"
        );
    }
}
