//! Customer search and match highlighting.

use super::customer::Customer;
use regex::RegexBuilder;

/// Customers whose name, mobile, address or coordinates contain `term`
/// (case-insensitive). A blank term matches everyone.
pub fn filter<'a>(customers: &'a [Customer], term: &str) -> Vec<&'a Customer> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return customers.iter().collect();
    }
    customers
        .iter()
        .filter(|c| {
            c.name.to_lowercase().contains(&term)
                || c.mobile.contains(&term)
                || c.address.to_lowercase().contains(&term)
                || c.coordinates.to_lowercase().contains(&term)
        })
        .collect()
}

/// Wrap every case-insensitive occurrence of `term` in `<mark>` tags.
pub fn highlight(text: &str, term: &str) -> String {
    let term = term.trim();
    if term.is_empty() {
        return text.to_string();
    }
    match RegexBuilder::new(&format!("({})", regex::escape(term)))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => re.replace_all(text, "<mark>$1</mark>").into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Copy of `customer` with `term` marked in every searchable field.
pub fn highlighted(customer: &Customer, term: &str) -> Customer {
    Customer {
        name: highlight(&customer.name, term),
        mobile: highlight(&customer.mobile, term),
        address: highlight(&customer.address, term),
        coordinates: highlight(&customer.coordinates, term),
        ..customer.clone()
    }
}

/// "Found N customer(s) for 'term'" line shown under the search box.
pub fn summary(count: usize, term: &str) -> String {
    match count {
        0 => format!("No customers match your search for \"{}\"", term.trim()),
        1 => format!("Found 1 customer for \"{}\"", term.trim()),
        n => format!("Found {} customers for \"{}\"", n, term.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(id: i64, name: &str, mobile: &str, address: &str) -> Customer {
        Customer {
            id,
            name: name.into(),
            mobile: mobile.into(),
            address: address.into(),
            coordinates: "23.153710, 79.753135".into(),
            map_url: None,
            photos: Vec::new(),
            created: None,
        }
    }

    fn sample() -> Vec<Customer> {
        vec![
            customer(1, "Asha Verma", "9876543210", "Napier Town, Jabalpur"),
            customer(2, "Ravi Kumar", "9123456780", "Civil Lines, Nagpur"),
        ]
    }

    #[test]
    fn test_filter_fields() {
        let all = sample();
        assert_eq!(filter(&all, "asha").len(), 1);
        assert_eq!(filter(&all, "JABALPUR")[0].id, 1);
        assert_eq!(filter(&all, "91234")[0].id, 2);
        assert_eq!(filter(&all, "79.753").len(), 2);
        assert!(filter(&all, "mumbai").is_empty());
    }

    #[test]
    fn test_blank_term_returns_all() {
        let all = sample();
        assert_eq!(filter(&all, "   ").len(), 2);
    }

    #[test]
    fn test_highlight() {
        assert_eq!(highlight("Asha Verma", "asha"), "<mark>Asha</mark> Verma");
        assert_eq!(highlight("a.b a.b", "a.b"), "<mark>a.b</mark> <mark>a.b</mark>");
        // metacharacters are matched literally
        assert_eq!(highlight("axb", "a.b"), "axb");
        assert_eq!(highlight("text", ""), "text");
    }

    #[test]
    fn test_highlighted_customer() {
        let all = sample();
        let c = highlighted(&all[0], "jabalpur");
        assert_eq!(c.address, "Napier Town, <mark>Jabalpur</mark>");
        assert_eq!(c.name, "Asha Verma");
        assert_eq!(c.id, 1);
        assert_eq!(highlighted(&all[1], "912").mobile, "<mark>912</mark>3456780");
    }

    #[test]
    fn test_summary() {
        assert_eq!(summary(1, "asha"), "Found 1 customer for \"asha\"");
        assert_eq!(summary(3, "a"), "Found 3 customers for \"a\"");
        assert!(summary(0, "zz").starts_with("No customers"));
    }
}
