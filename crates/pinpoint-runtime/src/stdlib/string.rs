//! String standard functions.

#![allow(missing_docs)]

use smol_str::SmolStr;

use crate::error::RuntimeError;
use crate::stdlib::helpers::{int_or, require_min, slice_bounds, str_arg};
use crate::stdlib::StandardLibrary;
use crate::value::{ArrayValue, Value};

pub const STR_PAD_LEFT: i64 = 0;
pub const STR_PAD_RIGHT: i64 = 1;
pub const STR_PAD_BOTH: i64 = 2;

pub fn register(lib: &mut StandardLibrary) {
    lib.register("strlen", strlen);
    lib.register("strtolower", strtolower);
    lib.register("strtoupper", strtoupper);
    lib.register("ucfirst", ucfirst);
    lib.register("lcfirst", lcfirst);
    lib.register("ucwords", ucwords);
    lib.register("trim", trim);
    lib.register("ltrim", ltrim);
    lib.register("rtrim", rtrim);
    lib.register("chop", rtrim);
    lib.register("str_repeat", str_repeat);
    lib.register("str_replace", str_replace);
    lib.register("str_contains", str_contains);
    lib.register("str_starts_with", str_starts_with);
    lib.register("str_ends_with", str_ends_with);
    lib.register("str_pad", str_pad);
    lib.register("str_split", str_split);
    lib.register("strrev", strrev);
    lib.register("strpos", strpos);
    lib.register("stripos", stripos);
    lib.register("strrpos", strrpos);
    lib.register("strstr", strstr);
    lib.register("substr", substr);
    lib.register("substr_count", substr_count);
    lib.register("strcmp", strcmp);
    lib.register("strcasecmp", strcasecmp);
    lib.register("ord", ord);
    lib.register("chr", chr);
    lib.register("implode", implode);
    lib.register("join", implode);
    lib.register("explode", explode);
    lib.register("sprintf", sprintf);
    lib.register("number_format", number_format);
    lib.register("nl2br", nl2br);
}

fn strlen(args: &[Value]) -> Result<Value, RuntimeError> {
    let text = str_arg("strlen", args, 0)?;
    Ok(Value::Int(i64::try_from(text.len()).unwrap_or(i64::MAX)))
}

fn strtolower(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::from(str_arg("strtolower", args, 0)?.to_ascii_lowercase()))
}

fn strtoupper(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::from(str_arg("strtoupper", args, 0)?.to_ascii_uppercase()))
}

fn map_first(text: &str, f: fn(&char) -> char) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => std::iter::once(f(&first)).chain(chars).collect(),
        None => String::new(),
    }
}

fn ucfirst(args: &[Value]) -> Result<Value, RuntimeError> {
    let text = str_arg("ucfirst", args, 0)?;
    Ok(Value::from(map_first(&text, char::to_ascii_uppercase)))
}

fn lcfirst(args: &[Value]) -> Result<Value, RuntimeError> {
    let text = str_arg("lcfirst", args, 0)?;
    Ok(Value::from(map_first(&text, char::to_ascii_lowercase)))
}

fn ucwords(args: &[Value]) -> Result<Value, RuntimeError> {
    let text = str_arg("ucwords", args, 0)?;
    let mut result = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        result.push(if at_word_start { c.to_ascii_uppercase() } else { c });
        at_word_start = c.is_ascii_whitespace();
    }
    Ok(Value::from(result))
}

const DEFAULT_TRIM: &str = " \t\n\r\0\u{0B}";

fn trim_set(args: &[Value]) -> Result<SmolStr, RuntimeError> {
    match args.get(1) {
        Some(chars) => chars.to_str(),
        None => Ok(SmolStr::new_inline(DEFAULT_TRIM)),
    }
}

fn trim(args: &[Value]) -> Result<Value, RuntimeError> {
    let text = str_arg("trim", args, 0)?;
    let set = trim_set(args)?;
    Ok(Value::from(text.trim_matches(|c: char| set.contains(c))))
}

fn ltrim(args: &[Value]) -> Result<Value, RuntimeError> {
    let text = str_arg("ltrim", args, 0)?;
    let set = trim_set(args)?;
    Ok(Value::from(text.trim_start_matches(|c: char| set.contains(c))))
}

fn rtrim(args: &[Value]) -> Result<Value, RuntimeError> {
    let text = str_arg("rtrim", args, 0)?;
    let set = trim_set(args)?;
    Ok(Value::from(text.trim_end_matches(|c: char| set.contains(c))))
}

fn str_repeat(args: &[Value]) -> Result<Value, RuntimeError> {
    let text = str_arg("str_repeat", args, 0)?;
    let times = int_or(args, 1, 0);
    let times = usize::try_from(times).map_err(|_| {
        RuntimeError::type_error("str_repeat(): Argument #2 ($times) must be greater than or equal to 0")
    })?;
    Ok(Value::from(text.repeat(times)))
}

fn replace_all(subject: &str, search: &[SmolStr], replace: &[SmolStr], replace_single: Option<&SmolStr>) -> String {
    let mut result = subject.to_string();
    for (index, needle) in search.iter().enumerate() {
        if needle.is_empty() {
            continue;
        }
        let with = replace_single
            .or_else(|| replace.get(index))
            .map_or("", SmolStr::as_str);
        result = result.replace(needle.as_str(), with);
    }
    result
}

fn string_list(value: &Value) -> Result<Vec<SmolStr>, RuntimeError> {
    match value {
        Value::Array(array) => array.values().map(Value::to_str).collect(),
        other => Ok(vec![other.to_str()?]),
    }
}

fn str_replace(args: &[Value]) -> Result<Value, RuntimeError> {
    require_min("str_replace", args, 3)?;
    let search = string_list(&args[0])?;
    let (replace, replace_single) = match &args[1] {
        Value::Array(_) => (string_list(&args[1])?, None),
        other => (Vec::new(), Some(other.to_str()?)),
    };
    match &args[2] {
        Value::Array(subjects) => {
            let mut result = ArrayValue::new();
            for (key, subject) in subjects.iter() {
                let replaced = replace_all(&subject.to_str()?, &search, &replace, replace_single.as_ref());
                result.insert(key.clone(), Value::from(replaced));
            }
            Ok(result.into())
        }
        subject => Ok(Value::from(replace_all(
            &subject.to_str()?,
            &search,
            &replace,
            replace_single.as_ref(),
        ))),
    }
}

fn str_contains(args: &[Value]) -> Result<Value, RuntimeError> {
    let haystack = str_arg("str_contains", args, 0)?;
    let needle = str_arg("str_contains", args, 1)?;
    Ok(Value::Bool(haystack.contains(needle.as_str())))
}

fn str_starts_with(args: &[Value]) -> Result<Value, RuntimeError> {
    let haystack = str_arg("str_starts_with", args, 0)?;
    let needle = str_arg("str_starts_with", args, 1)?;
    Ok(Value::Bool(haystack.starts_with(needle.as_str())))
}

fn str_ends_with(args: &[Value]) -> Result<Value, RuntimeError> {
    let haystack = str_arg("str_ends_with", args, 0)?;
    let needle = str_arg("str_ends_with", args, 1)?;
    Ok(Value::Bool(haystack.ends_with(needle.as_str())))
}

fn str_pad(args: &[Value]) -> Result<Value, RuntimeError> {
    let text = str_arg("str_pad", args, 0)?;
    let length = usize::try_from(int_or(args, 1, 0)).unwrap_or(0);
    let pad = match args.get(2) {
        Some(pad) => pad.to_str()?,
        None => SmolStr::new_inline(" "),
    };
    if pad.is_empty() {
        return Err(RuntimeError::type_error(
            "str_pad(): Argument #3 ($pad_string) must be a non-empty string",
        ));
    }
    let missing = length.saturating_sub(text.len());
    if missing == 0 {
        return Ok(Value::String(text));
    }
    let fill = |count: usize| pad.chars().cycle().take(count).collect::<String>();
    let padded = match int_or(args, 3, STR_PAD_RIGHT) {
        STR_PAD_LEFT => format!("{}{text}", fill(missing)),
        STR_PAD_BOTH => {
            let left = missing / 2;
            format!("{}{text}{}", fill(left), fill(missing - left))
        }
        _ => format!("{text}{}", fill(missing)),
    };
    Ok(Value::from(padded))
}

fn str_split(args: &[Value]) -> Result<Value, RuntimeError> {
    let text = str_arg("str_split", args, 0)?;
    let size = usize::try_from(int_or(args, 1, 1))
        .ok()
        .filter(|size| *size > 0)
        .ok_or_else(|| RuntimeError::type_error("str_split(): Argument #2 ($length) must be greater than 0"))?;
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Ok(ArrayValue::from_list([Value::from("")]).into());
    }
    let parts = chars
        .chunks(size)
        .map(|chunk| Value::from(chunk.iter().collect::<String>()));
    Ok(ArrayValue::from_list(parts).into())
}

fn strrev(args: &[Value]) -> Result<Value, RuntimeError> {
    let text = str_arg("strrev", args, 0)?;
    Ok(Value::from(text.chars().rev().collect::<String>()))
}

fn position(found: Option<usize>) -> Value {
    found.map_or(Value::Bool(false), |index| {
        Value::Int(i64::try_from(index).unwrap_or(i64::MAX))
    })
}

fn search_start(name: &str, haystack: &str, args: &[Value]) -> Result<usize, RuntimeError> {
    let (start, _) = slice_bounds(haystack.len(), int_or(args, 2, 0), None);
    if !haystack.is_char_boundary(start) {
        return Err(RuntimeError::type_error(format!(
            "{name}(): Argument #3 ($offset) is not on a character boundary"
        )));
    }
    Ok(start)
}

fn strpos(args: &[Value]) -> Result<Value, RuntimeError> {
    let haystack = str_arg("strpos", args, 0)?;
    let needle = str_arg("strpos", args, 1)?;
    let start = search_start("strpos", &haystack, args)?;
    Ok(position(haystack[start..].find(needle.as_str()).map(|index| index + start)))
}

fn stripos(args: &[Value]) -> Result<Value, RuntimeError> {
    let haystack = str_arg("stripos", args, 0)?.to_ascii_lowercase();
    let needle = str_arg("stripos", args, 1)?.to_ascii_lowercase();
    let start = search_start("stripos", &haystack, args)?;
    Ok(position(haystack[start..].find(&needle).map(|index| index + start)))
}

fn strrpos(args: &[Value]) -> Result<Value, RuntimeError> {
    let haystack = str_arg("strrpos", args, 0)?;
    let needle = str_arg("strrpos", args, 1)?;
    let start = search_start("strrpos", &haystack, args)?;
    Ok(position(haystack[start..].rfind(needle.as_str()).map(|index| index + start)))
}

fn strstr(args: &[Value]) -> Result<Value, RuntimeError> {
    let haystack = str_arg("strstr", args, 0)?;
    let needle = str_arg("strstr", args, 1)?;
    let before = args.get(2).is_some_and(Value::to_bool);
    Ok(match haystack.find(needle.as_str()) {
        Some(index) if before => Value::from(&haystack[..index]),
        Some(index) => Value::from(&haystack[index..]),
        None => Value::Bool(false),
    })
}

fn substr(args: &[Value]) -> Result<Value, RuntimeError> {
    let text = str_arg("substr", args, 0)?;
    let offset = int_or(args, 1, 0);
    let length = args.get(2).filter(|value| !value.is_null()).map(Value::to_int);
    let (start, end) = slice_bounds(text.len(), offset, length);
    let bytes = &text.as_bytes()[start..end];
    Ok(Value::from(String::from_utf8_lossy(bytes).into_owned()))
}

fn substr_count(args: &[Value]) -> Result<Value, RuntimeError> {
    let haystack = str_arg("substr_count", args, 0)?;
    let needle = str_arg("substr_count", args, 1)?;
    if needle.is_empty() {
        return Err(RuntimeError::type_error(
            "substr_count(): Argument #2 ($needle) cannot be empty",
        ));
    }
    let count = haystack.matches(needle.as_str()).count();
    Ok(Value::Int(i64::try_from(count).unwrap_or(i64::MAX)))
}

fn ordering_value(ordering: std::cmp::Ordering) -> Value {
    Value::Int(match ordering {
        std::cmp::Ordering::Less => -1,
        std::cmp::Ordering::Equal => 0,
        std::cmp::Ordering::Greater => 1,
    })
}

fn strcmp(args: &[Value]) -> Result<Value, RuntimeError> {
    let a = str_arg("strcmp", args, 0)?;
    let b = str_arg("strcmp", args, 1)?;
    Ok(ordering_value(a.cmp(&b)))
}

fn strcasecmp(args: &[Value]) -> Result<Value, RuntimeError> {
    let a = str_arg("strcasecmp", args, 0)?.to_ascii_lowercase();
    let b = str_arg("strcasecmp", args, 1)?.to_ascii_lowercase();
    Ok(ordering_value(a.cmp(&b)))
}

fn ord(args: &[Value]) -> Result<Value, RuntimeError> {
    let text = str_arg("ord", args, 0)?;
    Ok(Value::Int(text.bytes().next().map_or(0, i64::from)))
}

fn chr(args: &[Value]) -> Result<Value, RuntimeError> {
    require_min("chr", args, 1)?;
    let code = u8::try_from(args[0].to_int().rem_euclid(256)).unwrap_or(0);
    Ok(Value::from(char::from(code).to_string()))
}

fn implode(args: &[Value]) -> Result<Value, RuntimeError> {
    require_min("implode", args, 1)?;
    let (separator, pieces) = match (&args[0], args.get(1)) {
        (Value::Array(pieces), None) => (SmolStr::default(), pieces),
        (Value::Array(pieces), Some(separator)) | (separator, Some(Value::Array(pieces))) => {
            (separator.to_str()?, pieces)
        }
        _ => {
            return Err(RuntimeError::type_error(
                "implode(): Argument #2 ($array) must be of type array",
            ))
        }
    };
    let parts = pieces
        .values()
        .map(Value::to_str)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::from(parts.join(separator.as_str())))
}

fn explode(args: &[Value]) -> Result<Value, RuntimeError> {
    let separator = str_arg("explode", args, 0)?;
    let text = str_arg("explode", args, 1)?;
    if separator.is_empty() {
        return Err(RuntimeError::type_error(
            "explode(): Argument #1 ($separator) cannot be empty",
        ));
    }
    let limit = int_or(args, 2, i64::MAX);
    let parts: Vec<&str> = match usize::try_from(limit) {
        Ok(0) => vec![text.as_str()],
        Ok(limit) => text.splitn(limit, separator.as_str()).collect(),
        Err(_) => {
            let mut parts: Vec<&str> = text.split(separator.as_str()).collect();
            let drop = usize::try_from(limit.unsigned_abs()).unwrap_or(usize::MAX);
            parts.truncate(parts.len().saturating_sub(drop));
            parts
        }
    };
    Ok(ArrayValue::from_list(parts.into_iter().map(Value::from)).into())
}

fn sprintf(args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::from(format("sprintf", args)?))
}

#[derive(Debug)]
struct Conversion {
    left: bool,
    plus: bool,
    pad: char,
    width: usize,
    precision: Option<usize>,
}

impl Default for Conversion {
    fn default() -> Self {
        Self {
            left: false,
            plus: false,
            pad: ' ',
            width: 0,
            precision: None,
        }
    }
}

impl Conversion {
    fn apply(&self, body: String) -> String {
        let len = body.chars().count();
        if len >= self.width {
            return body;
        }
        let fill = self.width - len;
        if self.left {
            let pad = if self.pad == '0' { ' ' } else { self.pad };
            return format!("{body}{}", pad.to_string().repeat(fill));
        }
        if self.pad == '0' && (body.starts_with('-') || body.starts_with('+')) {
            let (sign, digits) = body.split_at(1);
            return format!("{sign}{}{digits}", "0".repeat(fill));
        }
        format!("{}{body}", self.pad.to_string().repeat(fill))
    }
}

/// `printf`-style formatting: `%[argnum$][flags][width][.precision]specifier`.
pub(crate) fn format(name: &str, args: &[Value]) -> Result<String, RuntimeError> {
    let template = str_arg(name, args, 0)?;
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    let mut next_arg = 1;

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            out.push('%');
            continue;
        }

        let mut conversion = Conversion::default();
        let mut digits = String::new();
        let mut argnum = None;
        while let Some(&c) = chars.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                chars.next();
            } else if c == '$' && !digits.is_empty() {
                argnum = digits.parse::<usize>().ok();
                digits.clear();
                chars.next();
            } else {
                break;
            }
        }
        // Digits not followed by `$` were the width (or a `0` flag).
        if let Some(rest) = digits.strip_prefix('0') {
            conversion.pad = '0';
            digits = rest.to_string();
        }
        if digits.is_empty() {
            while let Some(&c) = chars.peek() {
                match c {
                    '-' => conversion.left = true,
                    '+' => conversion.plus = true,
                    '0' => conversion.pad = '0',
                    ' ' => conversion.pad = ' ',
                    '\'' => {
                        chars.next();
                        if let Some(pad) = chars.peek() {
                            conversion.pad = *pad;
                        }
                    }
                    _ => break,
                }
                chars.next();
            }
            while let Some(c) = chars.peek().filter(|c| c.is_ascii_digit()) {
                digits.push(*c);
                chars.next();
            }
        }
        conversion.width = digits.parse().unwrap_or(0);
        if chars.peek() == Some(&'.') {
            chars.next();
            let mut precision = String::new();
            while let Some(c) = chars.peek().filter(|c| c.is_ascii_digit()) {
                precision.push(*c);
                chars.next();
            }
            conversion.precision = Some(precision.parse().unwrap_or(0));
        }

        let Some(specifier) = chars.next() else {
            return Err(RuntimeError::type_error(format!(
                "{name}(): missing format specifier at end of string"
            )));
        };
        let index = match argnum {
            Some(0) => {
                return Err(RuntimeError::type_error(format!(
                    "{name}(): argument number specifier must be greater than zero"
                )))
            }
            Some(position) => position,
            None => {
                next_arg += 1;
                next_arg - 1
            }
        };
        let value = args.get(index).ok_or_else(|| RuntimeError::ArgumentCount {
            function: SmolStr::new(name),
            expected: index + 1,
            given: args.len(),
        })?;
        out.push_str(&conversion.apply(convert(name, specifier, value, &conversion)?));
    }
    Ok(out)
}

fn signed(text: String, negative: bool, plus: bool) -> String {
    if !negative && plus {
        format!("+{text}")
    } else {
        text
    }
}

fn convert(name: &str, specifier: char, value: &Value, conversion: &Conversion) -> Result<String, RuntimeError> {
    Ok(match specifier {
        'd' | 'i' => {
            let number = value.to_int();
            signed(number.to_string(), number < 0, conversion.plus)
        }
        'u' => {
            #[allow(clippy::cast_sign_loss)]
            let number = value.to_int() as u64;
            number.to_string()
        }
        'f' | 'F' => {
            let number = value.to_float();
            let precision = conversion.precision.unwrap_or(6);
            signed(format!("{number:.precision$}"), number < 0.0, conversion.plus)
        }
        'e' | 'E' => {
            let number = value.to_float();
            let precision = conversion.precision.unwrap_or(6);
            let text = format!("{number:.precision$e}");
            let text = match text.split_once('e') {
                Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                    format!("{mantissa}e+{exponent}")
                }
                _ => text,
            };
            let text = if specifier == 'E' { text.to_uppercase() } else { text };
            signed(text, number < 0.0, conversion.plus)
        }
        's' => {
            let text = value.to_str()?;
            match conversion.precision {
                Some(precision) => text.chars().take(precision).collect(),
                None => text.to_string(),
            }
        }
        'x' => format!("{:x}", value.to_int()),
        'X' => format!("{:X}", value.to_int()),
        'o' => format!("{:o}", value.to_int()),
        'b' => format!("{:b}", value.to_int()),
        'c' => {
            let code = u8::try_from(value.to_int().rem_euclid(256)).unwrap_or(0);
            char::from(code).to_string()
        }
        other => {
            return Err(RuntimeError::type_error(format!(
                "{name}(): unknown format specifier \"{other}\""
            )))
        }
    })
}

fn number_format(args: &[Value]) -> Result<Value, RuntimeError> {
    require_min("number_format", args, 1)?;
    let number = args[0].to_float();
    let decimals = usize::try_from(int_or(args, 1, 0)).unwrap_or(0);
    let point = match args.get(2) {
        Some(point) => point.to_str()?,
        None => SmolStr::new_inline("."),
    };
    let thousands = match args.get(3) {
        Some(separator) => separator.to_str()?,
        None => SmolStr::new_inline(","),
    };

    let factor = 10f64.powi(i32::try_from(decimals).unwrap_or(i32::MAX));
    let rounded = (number.abs() * factor).round() / factor;
    let text = format!("{rounded:.decimals$}");
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));

    let mut grouped = String::new();
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push_str(&thousands);
        }
        grouped.push(digit);
    }
    let mut result = String::new();
    if number < 0.0 && rounded != 0.0 {
        result.push('-');
    }
    result.push_str(&grouped);
    if decimals > 0 {
        result.push_str(&point);
        result.push_str(fraction);
    }
    Ok(Value::from(result))
}

fn nl2br(args: &[Value]) -> Result<Value, RuntimeError> {
    let text = str_arg("nl2br", args, 0)?;
    Ok(Value::from(text.replace('\n', "<br />\n")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(func: fn(&[Value]) -> Result<Value, RuntimeError>, args: &[Value]) -> Value {
        func(args).unwrap()
    }

    #[test]
    fn test_sprintf_conversions() {
        let formatted = format(
            "sprintf",
            &[
                Value::from("%05.2f|%-4s|%'*6d|%x|%+d|%%"),
                Value::Float(3.14159),
                Value::from("ab"),
                Value::Int(42),
                Value::Int(255),
                Value::Int(7),
            ],
        )
        .unwrap();
        assert_eq!(formatted, "03.14|ab  |****42|ff|+7|%");
    }

    #[test]
    fn test_sprintf_positional_and_missing_argument() {
        let formatted = format(
            "sprintf",
            &[Value::from("%2$s %1$s"), Value::from("world"), Value::from("hello")],
        )
        .unwrap();
        assert_eq!(formatted, "hello world");

        let err = format("sprintf", &[Value::from("%s %s"), Value::from("x")]).unwrap_err();
        assert!(matches!(err, RuntimeError::ArgumentCount { .. }));
    }

    #[test]
    fn test_explode_limits() {
        let parts = |limit: i64| match call(explode, &[Value::from(","), Value::from("a,b,c"), Value::Int(limit)]) {
            Value::Array(array) => array.len(),
            _ => usize::MAX,
        };
        assert_eq!(parts(i64::MAX), 3);
        assert_eq!(parts(2), 2);
        assert_eq!(parts(-1), 2);
        assert_eq!(parts(0), 1);
    }

    #[test]
    fn test_substr_and_strpos() {
        assert_eq!(
            call(substr, &[Value::from("abcdef"), Value::Int(-3), Value::Int(2)]),
            Value::from("de")
        );
        assert_eq!(
            call(strpos, &[Value::from("hello"), Value::from("l")]),
            Value::Int(2)
        );
        assert_eq!(
            call(strpos, &[Value::from("hello"), Value::from("z")]),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_number_format_groups_thousands() {
        assert_eq!(
            call(number_format, &[Value::Float(1234567.891), Value::Int(2)]),
            Value::from("1,234,567.89")
        );
        assert_eq!(call(number_format, &[Value::Int(-999)]), Value::from("-999"));
    }

    #[test]
    fn test_str_pad_both() {
        assert_eq!(
            call(
                str_pad,
                &[Value::from("x"), Value::Int(5), Value::from("-"), Value::Int(STR_PAD_BOTH)]
            ),
            Value::from("--x--")
        );
    }
}
