use std::collections::HashMap;

use crate::error::ConfigError;

/// A recognised option: its canonical name, the other spellings that map
/// to it, and whether it collects a list of values.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub multi_valued: bool,
}

impl OptionSpec {
    pub const fn single(name: &'static str, aliases: &'static [&'static str]) -> Self {
        OptionSpec {
            name,
            aliases,
            multi_valued: false,
        }
    }

    /// An option taking zero or more values.
    pub const fn multi(name: &'static str, aliases: &'static [&'static str]) -> Self {
        OptionSpec {
            name,
            aliases,
            multi_valued: true,
        }
    }

    fn matches(&self, key: &str) -> bool {
        self.name == key || self.aliases.contains(&key)
    }
}

/// Options and positional arguments pulled out of a command line.
///
/// Options are stored under their canonical name whatever spelling was used.
#[derive(Debug, Clone, Default)]
pub struct ParsedArgs {
    options: HashMap<String, Vec<String>>,
    positionals: Vec<String>,
}

impl ParsedArgs {
    /// Last value given for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.options
            .get(name)
            .and_then(|values| values.last())
            .map(|v| v.as_str())
    }

    /// Every value given for `name`, in command-line order.
    pub fn values(&self, name: &str) -> &[String] {
        self.options.get(name).map_or(&[], |values| values.as_slice())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    pub fn positionals(&self) -> &[String] {
        &self.positionals
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

fn process_option(
    prefix: &str,
    args: &[String],
    i: usize,
    specs: &[OptionSpec],
    parsed: &mut ParsedArgs,
) -> Result<usize, ConfigError> {
    let arg = &args[i];
    let key = arg.trim_start_matches(prefix);

    let spec = specs
        .iter()
        .find(|spec| !key.is_empty() && spec.matches(key))
        .ok_or_else(|| ConfigError::InvalidOption(arg.clone()))?;

    let values: Vec<String> = if spec.multi_valued {
        args[i + 1..]
            .iter()
            .take_while(|value| !value.starts_with('-'))
            .cloned()
            .collect()
    } else {
        args.get(i + 1)
            .filter(|value| !value.starts_with('-'))
            .cloned()
            .into_iter()
            .collect()
    };

    if values.is_empty() && !spec.multi_valued {
        return Err(ConfigError::MissingValue(arg.clone()));
    }

    let consumed = values.len();
    let entry = parsed.options.entry(spec.name.to_string()).or_default();
    if spec.multi_valued {
        entry.extend(values);
    } else {
        // Last value wins for single-valued options.
        *entry = values;
    }
    Ok(i + 1 + consumed)
}

/// Split `args` (without the program name) into options and positionals.
///
/// Only options described by `specs` are accepted. Multi-valued options
/// swallow every following argument up to the next one starting with `-`,
/// possibly none; every other option takes exactly one value.
pub fn parse_args(args: &[String], specs: &[OptionSpec]) -> Result<ParsedArgs, ConfigError> {
    let mut parsed = ParsedArgs::default();
    let mut i = 0;

    while i < args.len() {
        let arg = &args[i];

        // "--" ends option parsing; the rest is positional
        if arg == "--" {
            parsed.positionals.extend(args[i + 1..].iter().cloned());
            break;
        }

        if arg == "-" {
            parsed.positionals.push(arg.clone());
            i += 1;
            continue;
        }

        if arg.starts_with("--") {
            i = process_option("--", args, i, specs, &mut parsed)?;
        } else if arg.starts_with('-') && arg.len() > 1 {
            i = process_option("-", args, i, specs, &mut parsed)?;
        } else {
            parsed.positionals.push(arg.clone());
            i += 1;
        }
    }

    Ok(parsed)
}
