//! Path resolution logic
//!
//! This module turns user-supplied path strings into canonical absolute
//! paths and provides the helpers the access-control engine and gateway use
//! to walk ancestors and subtrees.

/// The root path
pub const ROOT: &str = "/";

/// The directories a relative path is resolved against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathContext<'a> {
    /// Current working directory (absolute)
    pub cwd: &'a str,
    /// Previous working directory, the target of `-`
    pub previous: &'a str,
    /// Home directory of the acting identity, the target of `~`
    pub home: &'a str,
}

/// Path resolver
///
/// Handles resolving, splitting and walking paths.
pub struct PathResolver;

impl PathResolver {
    /// Resolves `raw` into a canonical absolute path
    ///
    /// # Examples
    ///
    /// ```
    /// use fs_path::{PathContext, PathResolver};
    ///
    /// let ctx = PathContext { cwd: "/home/bob", previous: "/tmp", home: "/home/bob" };
    /// assert_eq!(PathResolver::resolve("../alice/./notes", &ctx), "/home/alice/notes");
    /// assert_eq!(PathResolver::resolve("~/docs", &ctx), "/home/bob/docs");
    /// assert_eq!(PathResolver::resolve("-", &ctx), "/tmp");
    /// assert_eq!(PathResolver::resolve("/../../etc/", &ctx), "/etc");
    /// ```
    pub fn resolve(raw: &str, ctx: &PathContext<'_>) -> String {
        if raw == "-" {
            return Self::normalize(ctx.previous);
        }

        // Home substitution happens before general resolution
        let expanded;
        let raw = if raw.is_empty() || raw == "~" {
            ctx.home
        } else if let Some(rest) = raw.strip_prefix("~/") {
            expanded = format!("{}/{}", ctx.home, rest);
            expanded.as_str()
        } else {
            raw
        };

        if raw.starts_with('/') {
            Self::normalize(raw)
        } else {
            Self::normalize(&format!("{}/{}", ctx.cwd, raw))
        }
    }

    /// Normalizes an absolute path, applying `.` and `..`
    ///
    /// A relative input is treated as if it started at the root.
    pub fn normalize(path: &str) -> String {
        let mut stack: Vec<&str> = Vec::new();
        for component in path.split('/') {
            match component {
                "" | "." => {}
                ".." => {
                    stack.pop();
                }
                name => stack.push(name),
            }
        }

        if stack.is_empty() {
            ROOT.to_string()
        } else {
            let mut out = String::with_capacity(path.len());
            for component in stack {
                out.push('/');
                out.push_str(component);
            }
            out
        }
    }

    /// Splits a canonical path into its components
    ///
    /// The root has no components.
    pub fn components(path: &str) -> Vec<&str> {
        path.split('/').filter(|c| !c.is_empty()).collect()
    }

    /// Parent of a canonical path; `None` for the root
    pub fn parent(path: &str) -> Option<&str> {
        if path == ROOT {
            return None;
        }
        match path.rfind('/') {
            Some(0) => Some(ROOT),
            Some(index) => Some(&path[..index]),
            None => None,
        }
    }

    /// Final component of a canonical path; `None` for the root
    pub fn file_name(path: &str) -> Option<&str> {
        if path == ROOT {
            return None;
        }
        path.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Every ancestor directory, root first, excluding `path` itself
    pub fn ancestors(path: &str) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut current = Self::parent(path);
        while let Some(dir) = current {
            chain.push(dir);
            current = Self::parent(dir);
        }
        chain.reverse();
        chain
    }

    /// Joins a directory and a single name
    pub fn join(dir: &str, name: &str) -> String {
        if dir == ROOT {
            format!("/{}", name)
        } else {
            format!("{}/{}", dir, name)
        }
    }

    /// Returns whether `path` is `root` or lies beneath it
    ///
    /// Matches on component boundaries: `/tmpfile` is not within `/tmp`.
    pub fn is_within(path: &str, root: &str) -> bool {
        if root == ROOT {
            return path.starts_with('/');
        }
        path == root
            || (path.starts_with(root) && path.as_bytes().get(root.len()) == Some(&b'/'))
    }

    /// Validates a single path component name
    ///
    /// Returns true if the name is valid for a directory entry.
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains('/')
            && !name.contains('\0')
    }
}
