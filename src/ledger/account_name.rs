use std::fmt;

const FORBIDDEN_CHARS: [char; 10] = ['?', '/', '&', '(', ')', '\'', ' ', '[', ']', '\\'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountType {
    Assets,
    Liabilities,
    Equity,
    Income,
    Expenses,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Assets => "Assets",
            AccountType::Liabilities => "Liabilities",
            AccountType::Equity => "Equity",
            AccountType::Income => "Income",
            AccountType::Expenses => "Expenses",
        }
    }

    /// Splits `Assets:Bank:Checking` into its root type and the remaining parts.
    /// Returns `None` if the first segment isn't a beancount root type.
    pub fn split_ledger_name(name: &str) -> Option<(AccountType, Vec<&str>)> {
        let mut parts = name.split(':');
        let ty = match parts.next()? {
            "Assets" => AccountType::Assets,
            "Liabilities" => AccountType::Liabilities,
            "Equity" => AccountType::Equity,
            "Income" => AccountType::Income,
            "Expenses" => AccountType::Expenses,
            _ => return None,
        };
        Some((ty, parts.collect()))
    }

    pub fn ledger_name<S: AsRef<str>>(&self, path: &[S]) -> String {
        let mut name = self.as_str().to_string();
        for part in path {
            name.push(':');
            name.push_str(part.as_ref());
        }
        name
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turns a user-entered account path into a valid beancount account name.
///
/// Characters beancount doesn't allow become dashes, dashes next to a colon or at the
/// end are dropped, dash runs collapse into one dash, and the result is transliterated to
/// ASCII. If transliteration produced new characters the dash rules act on (e.g. `½` becomes
/// `1/2`), the dash rules run once more, so sanitizing a sanitized name is a no-op.
pub fn sanitize(name: &str) -> String {
    let cleaned = apply_dash_rules(name);
    let transliterated = deunicode::deunicode(&cleaned);
    if transliterated == cleaned {
        cleaned
    } else {
        apply_dash_rules(&transliterated)
    }
}

fn apply_dash_rules(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if FORBIDDEN_CHARS.contains(&c) { '-' } else { c })
        .collect();
    let replaced = collapse_dashes_around_colons(&replaced);
    collapse_dash_runs(replaced.trim_end_matches('-'))
}

fn collapse_dashes_around_colons(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ':' {
            while result.ends_with('-') {
                result.pop();
            }
            result.push(':');
            while chars.next_if_eq(&'-').is_some() {}
        } else {
            result.push(c);
        }
    }
    result
}

fn collapse_dash_runs(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for c in name.chars() {
        if c != '-' || !result.ends_with('-') {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("Assets:Checking", "Assets:Checking")]
    #[case("Assets:My Bank (old)", "Assets:My-Bank-old")]
    #[case("Expenses:Food & Drinks", "Expenses:Food-Drinks")]
    #[case("Expenses: Leisure :Travel", "Expenses:Leisure:Travel")]
    #[case("Assets:Giro/Sparbuch?", "Assets:Giro-Sparbuch")]
    #[case("Assets:[Backslash]\\x", "Assets:Backslash-x")]
    #[case("Expenses:Kid's Stuff", "Expenses:Kid-s-Stuff")]
    #[case("Assets:Café", "Assets:Cafe")]
    #[case("Assets:Straße", "Assets:Strasse")]
    #[case("Expenses:a-:-:-b", "Expenses:a::b")]
    #[case("Expenses:Trailing---", "Expenses:Trailing")]
    fn sanitizes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(expected, sanitize(input));
    }

    #[rstest]
    fn sanitize_is_idempotent(
        #[values(
            "Assets:My Bank (old)",
            "Expenses:Food & Drinks",
            "Income:½ Share",
            "Expenses:Ünïcödé / Ärger",
            "Expenses:北京 Trip",
            "Expenses:a – b",
            "Equity:Opening-Balances",
            "Expenses: :-: ",
        )]
        input: &str,
    ) {
        let once = sanitize(input);
        assert_eq!(once, sanitize(&once));
        assert!(once.is_ascii());
    }

    #[test]
    fn transliteration_output_is_sanitized_again() {
        let sanitized = sanitize("Income:½");
        assert!(!sanitized.contains('/'));
        assert!(!sanitized.contains(' '));
        assert!(!sanitized.ends_with('-'));
    }

    #[rstest]
    #[case("Assets:Bank:Checking", Some((AccountType::Assets, vec!["Bank", "Checking"])))]
    #[case("Equity:Opening-Balances", Some((AccountType::Equity, vec!["Opening-Balances"])))]
    #[case("Expenses", Some((AccountType::Expenses, vec![])))]
    #[case("Bank:Checking", None)]
    #[case("assets:Checking", None)]
    fn split_ledger_name(
        #[case] input: &str,
        #[case] expected: Option<(AccountType, Vec<&str>)>,
    ) {
        assert_eq!(expected, AccountType::split_ledger_name(input));
    }

    #[test]
    fn ledger_name() {
        assert_eq!(
            "Expenses:Food:Groceries",
            AccountType::Expenses.ledger_name(&["Food", "Groceries"])
        );
        assert_eq!("Income", AccountType::Income.ledger_name::<&str>(&[]));
    }
}
