//! Functions that conditions and watch expressions may call.

use once_cell::sync::Lazy;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;

/// Read-only standard library functions that are always callable.
///
/// Functions that mutate their arguments, take callbacks, or depend on
/// hidden iteration state are deliberately absent.
pub const BUILTIN_FUNCTIONS: &[&str] = &[
    // Strings
    "addcslashes",
    "addslashes",
    "bin2hex",
    "chop",
    "chr",
    "chunk_split",
    "convert_uudecode",
    "convert_uuencode",
    "count_chars",
    "crc32",
    "explode",
    "hex2bin",
    "html_entity_decode",
    "htmlentities",
    "htmlspecialchars",
    "htmlspecialchars_decode",
    "implode",
    "join",
    "lcfirst",
    "levenshtein",
    "ltrim",
    "md5",
    "metaphone",
    "nl2br",
    "number_format",
    "ord",
    "quoted_printable_decode",
    "quoted_printable_encode",
    "quotemeta",
    "rtrim",
    "sha1",
    "similar_text",
    "soundex",
    "sprintf",
    "str_contains",
    "str_ends_with",
    "str_getcsv",
    "str_pad",
    "str_repeat",
    "str_replace",
    "str_rot13",
    "str_split",
    "str_starts_with",
    "str_word_count",
    "strcasecmp",
    "strchr",
    "strcmp",
    "strcoll",
    "strcspn",
    "strip_tags",
    "stripcslashes",
    "stripos",
    "stripslashes",
    "stristr",
    "strlen",
    "strnatcasecmp",
    "strnatcmp",
    "strncasecmp",
    "strncmp",
    "strpbrk",
    "strpos",
    "strrchr",
    "strrev",
    "strripos",
    "strrpos",
    "strspn",
    "strstr",
    "strtolower",
    "strtoupper",
    "strtr",
    "strval",
    "substr",
    "substr_compare",
    "substr_count",
    "substr_replace",
    "trim",
    "ucfirst",
    "ucwords",
    "version_compare",
    "wordwrap",
    // Arrays
    "array_change_key_case",
    "array_chunk",
    "array_column",
    "array_combine",
    "array_count_values",
    "array_diff",
    "array_diff_assoc",
    "array_diff_key",
    "array_fill",
    "array_fill_keys",
    "array_flip",
    "array_intersect",
    "array_intersect_assoc",
    "array_intersect_key",
    "array_key_exists",
    "array_key_first",
    "array_key_last",
    "array_keys",
    "array_merge",
    "array_merge_recursive",
    "array_pad",
    "array_product",
    "array_replace",
    "array_replace_recursive",
    "array_reverse",
    "array_search",
    "array_slice",
    "array_sum",
    "array_unique",
    "array_values",
    "count",
    "in_array",
    "key_exists",
    "range",
    "sizeof",
    // Types
    "boolval",
    "doubleval",
    "empty",
    "floatval",
    "gettype",
    "intval",
    "is_a",
    "is_array",
    "is_bool",
    "is_callable",
    "is_double",
    "is_float",
    "is_int",
    "is_integer",
    "is_iterable",
    "is_long",
    "is_null",
    "is_numeric",
    "is_object",
    "is_resource",
    "is_scalar",
    "is_string",
    "is_subclass_of",
    "isset",
    "serialize",
    "unserialize",
    // Math
    "abs",
    "ceil",
    "floor",
    "max",
    "min",
    "round",
    // Classes and objects
    "class_exists",
    "function_exists",
    "get_called_class",
    "get_class",
    "get_class_methods",
    "get_class_vars",
    "get_object_vars",
    "get_parent_class",
    "interface_exists",
    "method_exists",
    "property_exists",
    "trait_exists",
    // Environment
    "extension_loaded",
    "gc_enabled",
    "get_cfg_var",
    "get_current_user",
    "get_declared_classes",
    "get_declared_interfaces",
    "get_declared_traits",
    "get_defined_constants",
    "get_defined_vars",
    "get_extension_funcs",
    "get_include_path",
    "get_included_files",
    "get_loaded_extensions",
    "get_required_files",
    "get_resource_type",
    "getenv",
    "getlastmod",
    "getmygid",
    "getmyinode",
    "getmypid",
    "getmyuid",
    "getrusage",
    "ini_get",
    "ini_get_all",
    "memory_get_peak_usage",
    "memory_get_usage",
    "php_ini_loaded_file",
    "php_ini_scanned_files",
    "php_sapi_name",
    "php_uname",
    "phpversion",
    "sys_get_temp_dir",
    "zend_version",
];

static BUILTIN_SET: Lazy<FxHashSet<&'static str>> =
    Lazy::new(|| BUILTIN_FUNCTIONS.iter().copied().collect());

/// Returns true if `name` is a built-in allowed function.
#[must_use]
pub fn is_builtin_allowed(name: &str) -> bool {
    BUILTIN_SET.contains(name)
}

/// The effective allow-list: built-ins plus user-configured names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    functions: FxHashSet<SmolStr>,
    methods: FxHashSet<SmolStr>,
}

impl AllowList {
    /// Builds an allow-list from user function and method names.
    pub fn new(
        functions: impl IntoIterator<Item = SmolStr>,
        methods: impl IntoIterator<Item = SmolStr>,
    ) -> Self {
        Self {
            functions: functions.into_iter().collect(),
            methods: methods.into_iter().collect(),
        }
    }

    /// Replaces the user function list.
    pub fn set_functions(&mut self, functions: impl IntoIterator<Item = SmolStr>) {
        self.functions = functions.into_iter().collect();
    }

    /// Replaces the user method list.
    pub fn set_methods(&mut self, methods: impl IntoIterator<Item = SmolStr>) {
        self.methods = methods.into_iter().collect();
    }

    /// Whether `name` may be called as a plain function.
    #[must_use]
    pub fn allows_function(&self, name: &str) -> bool {
        is_builtin_allowed(name) || self.functions.contains(name)
    }

    /// Whether `Class::method` may be called statically.
    #[must_use]
    pub fn allows_method(&self, class: &str, method: &str) -> bool {
        self.methods.contains(format!("{class}::{method}").as_str())
    }

    /// User function names, sorted.
    #[must_use]
    pub fn user_functions(&self) -> Vec<SmolStr> {
        let mut names: Vec<_> = self.functions.iter().cloned().collect();
        names.sort();
        names
    }

    /// User method names, sorted.
    #[must_use]
    pub fn user_methods(&self) -> Vec<SmolStr> {
        let mut names: Vec<_> = self.methods.iter().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_have_no_duplicates() {
        assert_eq!(BUILTIN_SET.len(), BUILTIN_FUNCTIONS.len());
    }

    #[test]
    fn test_mutating_functions_are_not_builtin() {
        for name in ["array_walk", "settype", "array_splice", "array_map", "unlink"] {
            assert!(!is_builtin_allowed(name), "{name} must not be allowed");
        }
    }

    #[test]
    fn test_user_lists() {
        let mut allow = AllowList::new(["my_helper".into()], ["Cart::total".into()]);
        assert!(allow.allows_function("strlen"));
        assert!(allow.allows_function("my_helper"));
        assert!(allow.allows_method("Cart", "total"));
        assert!(!allow.allows_method("Cart", "clear"));

        allow.set_functions(Vec::new());
        assert!(!allow.allows_function("my_helper"));
    }
}
