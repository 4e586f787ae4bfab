//! Fixed stock categories and heading-label mapping

/// One of the five fixed listing groups on the stock page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Seeds,
    Gear,
    EggShop,
    Honey,
    Cosmetics,
}

impl Category {
    /// All categories, in canonical response order
    pub const ALL: [Category; 5] = [
        Category::Seeds,
        Category::Gear,
        Category::EggShop,
        Category::Honey,
        Category::Cosmetics,
    ];

    /// Stable key used in the database, query strings, and JSON responses
    pub fn as_key(&self) -> &'static str {
        match self {
            Self::Seeds => "seeds",
            Self::Gear => "gear",
            Self::EggShop => "egg_shop",
            Self::Honey => "honey",
            Self::Cosmetics => "cosmetics",
        }
    }

    /// Parses an exact category key (the inverse of `as_key`)
    pub fn from_key(s: &str) -> Option<Self> {
        match s {
            "seeds" => Some(Self::Seeds),
            "gear" => Some(Self::Gear),
            "egg_shop" => Some(Self::EggShop),
            "honey" => Some(Self::Honey),
            "cosmetics" => Some(Self::Cosmetics),
            _ => None,
        }
    }

    /// Maps a page heading to a category by substring match.
    ///
    /// Checks run in a fixed precedence order so that labels containing
    /// several markers resolve deterministically ("Egg Gear Shop" is gear,
    /// not egg_shop). Labels matching nothing return `None` and are skipped
    /// by the parser.
    pub fn from_label(label: &str) -> Option<Self> {
        let lower = label.to_lowercase();
        if lower.contains("gear") {
            Some(Self::Gear)
        } else if lower.contains("egg") {
            Some(Self::EggShop)
        } else if lower.contains("seeds") {
            Some(Self::Seeds)
        } else if lower.contains("honey") {
            Some(Self::Honey)
        } else if lower.contains("cosmetics") {
            Some(Self::Cosmetics)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_roundtrip() {
        for category in &Category::ALL {
            let key = category.as_key();
            let parsed = Category::from_key(key);
            assert_eq!(Some(*category), parsed);
        }
    }

    #[test]
    fn test_from_key_rejects_unknown() {
        assert_eq!(Category::from_key("weather"), None);
        assert_eq!(Category::from_key("Seeds"), None);
        assert_eq!(Category::from_key(""), None);
    }

    #[test]
    fn test_from_label_basic() {
        assert_eq!(Category::from_label("SEEDS STOCK"), Some(Category::Seeds));
        assert_eq!(Category::from_label("Gear Stock"), Some(Category::Gear));
        assert_eq!(Category::from_label("Egg Shop"), Some(Category::EggShop));
        assert_eq!(Category::from_label("Honey Stock"), Some(Category::Honey));
        assert_eq!(
            Category::from_label("Cosmetics Stock"),
            Some(Category::Cosmetics)
        );
    }

    #[test]
    fn test_from_label_precedence() {
        // "gear" outranks "egg" when both appear in one heading
        assert_eq!(Category::from_label("Egg Gear Shop"), Some(Category::Gear));
        // "egg" outranks "seeds"
        assert_eq!(
            Category::from_label("Egg and Seeds"),
            Some(Category::EggShop)
        );
    }

    #[test]
    fn test_from_label_unknown() {
        assert_eq!(Category::from_label("Weather Events"), None);
        assert_eq!(Category::from_label(""), None);
    }
}
