//! Call-site macros

/// Build a [`CallSite`](crate::context::CallSite) for the current function,
/// capturing the `Debug` rendering of the named locals
///
/// # Example
///
/// ```
/// # use faultline_core::call_site;
/// let user_id = 42;
/// let path = "/tmp/in.csv";
/// let site = call_site!("import_users", user_id, path);
/// assert_eq!(site.render_locals().as_deref(), Some("{user_id: 42, path: \"/tmp/in.csv\"}"));
/// ```
#[macro_export]
macro_rules! call_site {
    ($function:expr) => {
        $crate::context::CallSite::new($function)
    };
    ($function:expr, $($local:ident),+ $(,)?) => {
        $crate::context::CallSite::new($function)
            $(.with_local(stringify!($local), &$local))+
    };
}
