//! Outbound share formats for a customer: messaging links, mail, maps, vCard.

use super::customer::Customer;
use crate::location::types::encode_component as encode;
use std::fmt;
use std::str::FromStr;

const FOOTER: &str = "Shared via pinbook";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareFormat {
    WhatsApp,
    Sms,
    Email,
    Maps,
    Text,
    VCard,
}

impl FromStr for ShareFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "whatsapp" | "wa" => Ok(Self::WhatsApp),
            "sms" => Ok(Self::Sms),
            "email" | "mail" => Ok(Self::Email),
            "maps" | "map" => Ok(Self::Maps),
            "text" | "clipboard" => Ok(Self::Text),
            "vcard" | "vcf" => Ok(Self::VCard),
            other => Err(format!(
                "Unknown share format '{}'. Use whatsapp, sms, email, maps, text or vcard.",
                other
            )),
        }
    }
}

impl fmt::Display for ShareFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::WhatsApp => "whatsapp",
            Self::Sms => "sms",
            Self::Email => "email",
            Self::Maps => "maps",
            Self::Text => "text",
            Self::VCard => "vcard",
        };
        f.write_str(s)
    }
}

/// Formats customer details for sharing.
pub struct Sharer<'a> {
    phone_prefix: &'a str,
}

impl<'a> Sharer<'a> {
    pub fn new(phone_prefix: &'a str) -> Self {
        Self { phone_prefix }
    }

    /// Render `customer` in `format`. `None` when the format needs coordinates
    /// the customer does not have.
    pub fn render(&self, customer: &Customer, format: ShareFormat) -> Option<String> {
        match format {
            ShareFormat::WhatsApp => Some(self.whatsapp_url(customer)),
            ShareFormat::Sms => Some(self.sms_url(customer)),
            ShareFormat::Email => Some(self.mailto_url(customer)),
            ShareFormat::Maps => customer.coordinate().map(|c| c.search_url()),
            ShareFormat::Text => Some(self.plain_text(customer)),
            ShareFormat::VCard => Some(self.vcard(customer)),
        }
    }

    fn phone(&self, c: &Customer) -> String {
        format!("{}-{}", self.phone_prefix, c.mobile)
    }

    pub fn whatsapp_url(&self, c: &Customer) -> String {
        let mut msg = format!(
            "*{}*\n\n\u{1F4F1} *Mobile:* {}\n\u{1F4CD} *Address:* {}\n\u{1F5FA}\u{FE0F} *Coordinates:* {}",
            c.name,
            self.phone(c),
            c.address,
            c.coordinates
        );
        if let Some(url) = &c.map_url {
            msg.push_str(&format!("\n\u{1F5FA}\u{FE0F} *Map Link:* {}", url));
        }
        msg.push_str(&format!("\n\n_{}_", FOOTER));
        format!("https://wa.me/?text={}", encode(&msg))
    }

    pub fn sms_url(&self, c: &Customer) -> String {
        let mut msg = format!(
            "{}\nMobile: {}\nAddress: {}\nCoordinates: {}",
            c.name,
            self.phone(c),
            c.address,
            c.coordinates
        );
        if let Some(url) = &c.map_url {
            msg.push_str(&format!("\nMap: {}", url));
        }
        msg.push_str(&format!("\n\n{}", FOOTER));
        format!("sms:?body={}", encode(&msg))
    }

    pub fn mailto_url(&self, c: &Customer) -> String {
        let subject = format!("Customer Details: {}", c.name);
        let mut body = format!(
            "Customer Information:\n\nName: {}\nMobile: {}\nAddress: {}\nCoordinates: {}",
            c.name,
            self.phone(c),
            c.address,
            c.coordinates
        );
        if let Some(url) = &c.map_url {
            body.push_str(&format!("\nMap Link: {}", url));
        }
        body.push_str(&format!("\n\n{}", FOOTER));
        format!("mailto:?subject={}&body={}", encode(&subject), encode(&body))
    }

    /// Clipboard block.
    pub fn plain_text(&self, c: &Customer) -> String {
        let mut text = format!(
            "Name: {}\nMobile: {}\nAddress: {}\nCoordinates: {}",
            c.name,
            self.phone(c),
            c.address,
            c.coordinates
        );
        if let Some(url) = &c.map_url {
            text.push_str(&format!("\nMap: {}", url));
        }
        text
    }

    /// vCard 3.0 contact card, CRLF line endings.
    pub fn vcard(&self, c: &Customer) -> String {
        let mut lines = vec![
            "BEGIN:VCARD".to_string(),
            "VERSION:3.0".to_string(),
            format!("FN:{}", c.name),
            format!("TEL;TYPE=CELL:{}{}", self.phone_prefix, c.mobile),
            format!("ADR;TYPE=HOME:;;{};", c.address.replace(['\r', '\n'], " ")),
            format!("NOTE:Coordinates: {}", c.coordinates),
        ];
        if let Some(url) = &c.map_url {
            lines.push(format!("URL:{}", url));
        }
        lines.push("END:VCARD".to_string());
        lines.join("\r\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::customer::NO_COORDINATES;

    fn customer() -> Customer {
        Customer {
            id: 1,
            name: "Asha Verma".into(),
            mobile: "9876543210".into(),
            address: "Napier Town\nJabalpur".into(),
            coordinates: "23.153710, 79.753135".into(),
            map_url: Some("https://maps.google.com/?q=23.153710,79.753135".into()),
            photos: Vec::new(),
            created: None,
        }
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("WhatsApp".parse::<ShareFormat>().unwrap(), ShareFormat::WhatsApp);
        assert_eq!("vcf".parse::<ShareFormat>().unwrap(), ShareFormat::VCard);
        assert!("fax".parse::<ShareFormat>().is_err());
    }

    #[test]
    fn test_encode_component() {
        assert_eq!(encode("a b+c,d"), "a%20b%2Bc%2Cd");
    }

    #[test]
    fn test_plain_text() {
        let s = Sharer::new("+91");
        let text = s.plain_text(&customer());
        assert!(text.starts_with("Name: Asha Verma\nMobile: +91-9876543210\n"));
        assert!(text.ends_with("Map: https://maps.google.com/?q=23.153710,79.753135"));
    }

    #[test]
    fn test_links_are_encoded() {
        let s = Sharer::new("+91");
        let wa = s.whatsapp_url(&customer());
        assert!(wa.starts_with("https://wa.me/?text=*Asha%20Verma*"));
        assert!(!wa.contains(' '));
        let mail = s.mailto_url(&customer());
        assert!(mail.starts_with("mailto:?subject=Customer%20Details%3A%20Asha%20Verma&body="));
        assert!(s.sms_url(&customer()).starts_with("sms:?body=Asha%20Verma%0AMobile"));
    }

    #[test]
    fn test_vcard() {
        let card = Sharer::new("+91").vcard(&customer());
        let lines: Vec<&str> = card.split("\r\n").collect();
        assert_eq!(lines[0], "BEGIN:VCARD");
        assert_eq!(lines[3], "TEL;TYPE=CELL:+919876543210");
        assert_eq!(lines[4], "ADR;TYPE=HOME:;;Napier Town Jabalpur;");
        assert_eq!(lines.last(), Some(&"END:VCARD"));
    }

    #[test]
    fn test_maps_requires_coordinates() {
        let s = Sharer::new("+91");
        let url = s.render(&customer(), ShareFormat::Maps).unwrap();
        assert_eq!(url, "https://www.google.com/maps/search/?api=1&query=23.153710%2C%2079.753135");

        let mut c = customer();
        c.coordinates = NO_COORDINATES.into();
        assert!(s.render(&c, ShareFormat::Maps).is_none());
    }
}
