//! Method-keyed route table.
//!
//! Routes are tried in registration order; the first pattern that matches
//! both the method and the path wins.

use http::Method;
use thiserror::Error;

use crate::{Params, PathPattern, PatternError};

/// Route registration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouterError {
    /// The template failed to compile.
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// Method and template are already registered.
    #[error("route {method} {template} is already registered")]
    Duplicate {
        /// HTTP method.
        method: Method,
        /// Route template.
        template: String,
    },
}

#[derive(Debug, Clone)]
struct Route<T> {
    method: Method,
    pattern: PathPattern,
    value: T,
}

/// A successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a, T> {
    /// Value registered with the route.
    pub value: &'a T,
    /// Pattern that matched.
    pub pattern: &'a PathPattern,
    /// Captured parameters.
    pub params: Params,
}

/// Route table mapping `(method, template)` to a value.
///
/// ```rust
/// use http::Method;
/// use lite_router::Router;
///
/// let mut router = Router::new();
/// router.insert(Method::GET, "/foo/:id", "get-foo").unwrap();
///
/// let m = router.find(&Method::GET, "/foo/123").unwrap();
/// assert_eq!(*m.value, "get-foo");
/// assert_eq!(m.params.get("id"), Some("123"));
/// ```
#[derive(Debug, Clone)]
pub struct Router<T> {
    routes: Vec<Route<T>>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<T> Router<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route, returning its compiled pattern.
    pub fn insert(
        &mut self,
        method: Method,
        template: &str,
        value: T,
    ) -> Result<&PathPattern, RouterError> {
        let pattern = PathPattern::parse(template)?;
        if self.contains(&method, &pattern) {
            return Err(RouterError::Duplicate {
                method,
                template: template.to_string(),
            });
        }
        self.routes.push(Route {
            method,
            pattern,
            value,
        });
        let last = self.routes.len() - 1;
        Ok(&self.routes[last].pattern)
    }

    /// Unregisters `method` + `template`, returning its value.
    pub fn remove(&mut self, method: &Method, template: &str) -> Option<T> {
        let index = self
            .routes
            .iter()
            .position(|r| r.method == *method && r.pattern.template() == template)?;
        Some(self.routes.remove(index).value)
    }

    /// Returns true if a route with `method` already matches exactly the
    /// paths `pattern` matches.
    #[must_use]
    pub fn contains(&self, method: &Method, pattern: &PathPattern) -> bool {
        self.routes.iter().any(|r| {
            r.method == *method && r.pattern.as_regex().as_str() == pattern.as_regex().as_str()
        })
    }

    /// Finds the route for a request.
    #[must_use]
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, T>> {
        self.routes
            .iter()
            .filter(|r| r.method == *method)
            .find_map(|r| {
                r.pattern.captures(path).map(|params| RouteMatch {
                    value: &r.value,
                    pattern: &r.pattern,
                    params,
                })
            })
    }

    /// Methods registered for a path, in registration order.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let mut methods: Vec<Method> = Vec::new();
        for route in &self.routes {
            if route.pattern.captures(path).is_some() && !methods.contains(&route.method) {
                methods.push(route.method.clone());
            }
        }
        methods
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterates `(method, pattern, value)` in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Method, &PathPattern, &T)> {
        self.routes.iter().map(|r| (&r.method, &r.pattern, &r.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> Router<&'static str> {
        let mut router = Router::new();
        router.insert(Method::GET, "/foo", "list").unwrap();
        router.insert(Method::GET, "/foo/:id", "get").unwrap();
        router.insert(Method::DELETE, "/foo/:id", "delete").unwrap();
        router.insert(Method::POST, "/foo", "create").unwrap();
        router
    }

    #[test]
    fn finds_by_method_and_path() {
        let router = router();
        assert_eq!(*router.find(&Method::GET, "/foo").unwrap().value, "list");
        assert_eq!(*router.find(&Method::POST, "/foo").unwrap().value, "create");

        let m = router.find(&Method::DELETE, "/foo/9").unwrap();
        assert_eq!(*m.value, "delete");
        assert_eq!(m.params.get("id"), Some("9"));
        assert_eq!(m.pattern.canonical(), "/foo/{id}");
    }

    #[test]
    fn misses() {
        let router = router();
        assert!(router.find(&Method::PUT, "/foo").is_none());
        assert!(router.find(&Method::GET, "/bar").is_none());
        assert!(router.find(&Method::GET, "/foo/1/2").is_none());
    }

    #[test]
    fn allowed_methods_for_path() {
        let router = router();
        assert_eq!(
            router.allowed_methods("/foo/1"),
            vec![Method::GET, Method::DELETE]
        );
        assert!(router.allowed_methods("/nope").is_empty());
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut router = router();
        let err = router.insert(Method::GET, "/foo/:other", "again").unwrap_err();
        assert!(matches!(err, RouterError::Duplicate { .. }));
        assert_eq!(router.len(), 4);

        let pattern = PathPattern::parse("/foo/:x").unwrap();
        assert!(router.contains(&Method::GET, &pattern));
        assert!(!router.contains(&Method::PATCH, &pattern));
    }

    #[test]
    fn pattern_errors_surface() {
        let mut router: Router<()> = Router::new();
        let err = router.insert(Method::GET, "no-slash", ()).unwrap_err();
        assert_eq!(
            err,
            RouterError::Pattern(PatternError::NotAbsolute("no-slash".to_string()))
        );
        assert!(router.is_empty());
    }

    #[test]
    fn removed_routes_stop_matching() {
        let mut router = Router::new();
        router.insert(Method::GET, "/foo/:id", 1).unwrap();
        router.insert(Method::POST, "/foo/:id", 2).unwrap();

        assert_eq!(router.remove(&Method::GET, "/foo/:id"), Some(1));
        assert_eq!(router.remove(&Method::GET, "/foo/:id"), None);
        assert!(router.find(&Method::GET, "/foo/1").is_none());
        assert_eq!(*router.find(&Method::POST, "/foo/1").unwrap().value, 2);
    }
}
