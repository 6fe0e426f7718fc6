//! # URL Template Resolver
//!
//! Pure mapping from a URL pattern with `${name}` placeholders, the declared
//! parameter bindings and the runtime argument values to a concrete request
//! URL.
//!
//! A placeholder present in the pattern consumes its argument entirely; a
//! bound argument without a placeholder is appended to the query string as
//! one or more `&name=value` pairs. Callback arguments are never part of the
//! URL, and unbound non-message arguments are ignored with a warning.
use crate::binding::{Arg, ConfigurationError, ParamBinding};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters escaped in substituted values. Everything that would change
/// the meaning of a path segment or query component.
const VALUE_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'&')
    .add(b'=')
    .add(b'+')
    .add(b'%')
    .add(b'/');

/// Builds the concrete request URL for one invocation.
///
/// In `pattern_only` mode (a structured-message payload was recognized)
/// placeholders are still substituted but no query string is generated.
pub(crate) fn build_request_url(
    base_url: &str,
    pattern: &str,
    params: &[Option<ParamBinding>],
    args: &[Arg],
    pattern_only: bool,
) -> Result<String, ConfigurationError> {
    let mut url = pattern.to_string();
    if !pattern_only {
        url.push('?');
    }

    for (position, arg) in args.iter().enumerate() {
        if matches!(arg, Arg::Callback(_)) {
            continue;
        }

        let binding = params.get(position).and_then(Option::as_ref);
        let (name, required) = match binding {
            None => {
                if !matches!(arg, Arg::Message(_)) {
                    tracing::warn!(
                        position,
                        "argument does not have a parameter binding and will be ignored"
                    );
                }
                continue;
            }
            // The body marker is handled by payload detection, not the URL.
            Some(ParamBinding::Body) => continue,
            Some(ParamBinding::Named { name, required }) => (name, *required),
        };

        if arg.is_absent() {
            if required {
                return Err(ConfigurationError::MissingRequiredParam(name.clone()));
            }
            continue;
        }

        let token = format!("${{{name}}}");
        if url.contains(&token) {
            match arg {
                Arg::Repeated(_) => return Err(ConfigurationError::ArrayInPath(name.clone())),
                Arg::Scalar(Some(value)) => url = url.replace(&token, &encode(value)),
                _ => {
                    tracing::warn!(
                        position,
                        name,
                        "argument can not be substituted into the URL path and will be ignored"
                    );
                }
            }
        } else if !pattern_only {
            match arg {
                Arg::Scalar(Some(value)) => {
                    url.push_str(&format!("&{name}={}", encode(value)));
                }
                Arg::Repeated(items) => {
                    for item in items.iter().flatten() {
                        url.push_str(&format!("&{name}={}", encode(item)));
                    }
                }
                _ => {
                    tracing::warn!(
                        position,
                        name,
                        "argument can not be appended to the query string and will be ignored"
                    );
                }
            }
        }
    }

    Ok(format!("{base_url}{url}"))
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, VALUE_ENCODE_SET).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://host/svc";

    fn named(name: &str) -> Option<ParamBinding> {
        Some(ParamBinding::named(name))
    }

    #[test]
    fn placeholder_substitution_excludes_the_query_string() {
        let url = build_request_url(
            BASE,
            "/testers/${id}",
            &[named("id")],
            &[Arg::scalar(5)],
            false,
        )
        .unwrap();
        assert_eq!(url, "http://host/svc/testers/5?");
    }

    #[test]
    fn unmatched_parameters_are_appended_to_the_query_string() {
        let url = build_request_url(
            BASE,
            "/testers/${id}",
            &[named("id"), named("verbose")],
            &[Arg::scalar(5), Arg::scalar(true)],
            false,
        )
        .unwrap();
        assert_eq!(url, "http://host/svc/testers/5?&verbose=true");
    }

    #[test]
    fn values_are_percent_encoded() {
        let url = build_request_url(
            BASE,
            "/items/${name}",
            &[named("name"), named("q")],
            &[Arg::scalar("a b/c"), Arg::scalar("x&y=z")],
            false,
        )
        .unwrap();
        assert_eq!(url, "http://host/svc/items/a%20b%2Fc?&q=x%26y%3Dz");
    }

    #[test]
    fn arrays_are_rejected_in_path_segments() {
        let result = build_request_url(
            BASE,
            "/testers/${id}",
            &[named("id")],
            &[Arg::repeated([Some(1), Some(2)])],
            false,
        );
        assert!(matches!(result, Err(ConfigurationError::ArrayInPath(name)) if name == "id"));
    }

    #[test]
    fn arrays_expand_to_repeated_query_pairs_skipping_nulls() {
        let url = build_request_url(
            BASE,
            "",
            &[named("tag")],
            &[Arg::repeated([Some("a"), None, Some("b")])],
            false,
        )
        .unwrap();
        assert_eq!(url, "http://host/svc?&tag=a&tag=b");
    }

    #[test]
    fn required_absent_parameter_is_a_configuration_error() {
        let result = build_request_url(
            BASE,
            "/testers/${id}",
            &[Some(ParamBinding::required("id"))],
            &[Arg::absent()],
            false,
        );
        assert!(
            matches!(result, Err(ConfigurationError::MissingRequiredParam(name)) if name == "id")
        );
    }

    #[test]
    fn optional_absent_parameter_is_skipped() {
        let url = build_request_url(
            BASE,
            "",
            &[named("id"), named("verbose")],
            &[Arg::absent(), Arg::scalar(true)],
            false,
        )
        .unwrap();
        assert_eq!(url, "http://host/svc?&verbose=true");
    }

    #[test]
    fn pattern_only_mode_substitutes_but_never_appends() {
        let url = build_request_url(
            BASE,
            "/testers/${id}",
            &[named("id"), named("verbose")],
            &[Arg::scalar(5), Arg::scalar(true)],
            true,
        )
        .unwrap();
        assert_eq!(url, "http://host/svc/testers/5");
    }

    #[test]
    fn callbacks_and_unbound_arguments_are_ignored() {
        let url = build_request_url(
            BASE,
            "",
            &[named("id"), None],
            &[Arg::scalar(7), Arg::scalar("stray")],
            false,
        )
        .unwrap();
        assert_eq!(url, "http://host/svc?&id=7");
    }
}
