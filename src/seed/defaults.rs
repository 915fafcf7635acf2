/// Default catalog data inserted into empty collections
use crate::content::LocalizedText;

pub struct DefaultCategory {
    pub slug: &'static str,
    pub en: &'static str,
    pub ar: &'static str,
}

pub const DEFAULT_CATEGORIES: &[DefaultCategory] = &[
    DefaultCategory { slug: "flowers", en: "Flowers", ar: "زهور" },
    DefaultCategory { slug: "plants", en: "Plants", ar: "نباتات" },
    DefaultCategory { slug: "chocolates", en: "Chocolates", ar: "شوكولاتة" },
    DefaultCategory { slug: "gift-boxes", en: "Gift Boxes", ar: "صناديق الهدايا" },
    DefaultCategory { slug: "occasions", en: "Occasions", ar: "مناسبات" },
];

pub struct DefaultCountry {
    pub id: &'static str,
    pub en: &'static str,
    pub ar: &'static str,
}

pub const DEFAULT_COUNTRIES: &[DefaultCountry] = &[
    DefaultCountry { id: "uae", en: "United Arab Emirates", ar: "الإمارات العربية المتحدة" },
    DefaultCountry { id: "saudi-arabia", en: "Saudi Arabia", ar: "المملكة العربية السعودية" },
    DefaultCountry { id: "oman", en: "Oman", ar: "عُمان" },
];

pub fn default_site_name() -> LocalizedText {
    LocalizedText::new("Showcase", "المعرض")
}

pub fn default_category(slug: &str) -> Option<&'static DefaultCategory> {
    DEFAULT_CATEGORIES.iter().find(|c| c.slug == slug)
}
