use serde::{ Serialize, Deserialize };

/// A catalog entry. Prices are whole currency units (LKR).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: u32,
    pub name: String,
    pub category: String,
    pub price: u64,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub image: String,
}

pub const ALL_CATEGORIES: &str = "All";

/// `"All"` followed by the distinct categories in sorted order.
pub fn categories(products: &[Product]) -> Vec<String> {
    let mut cats: Vec<String> = products
        .iter()
        .map(|p| p.category.clone())
        .collect();
    cats.sort();
    cats.dedup();
    cats.insert(0, ALL_CATEGORIES.to_string());
    cats
}

pub fn filter_by_category(products: Vec<Product>, category: Option<&str>) -> Vec<Product> {
    match category {
        None | Some(ALL_CATEGORIES) => products,
        Some(cat) =>
            products
                .into_iter()
                .filter(|p| p.category == cat)
                .collect(),
    }
}

pub fn find_by_name<'a>(products: &'a [Product], name: &str) -> Option<&'a Product> {
    products.iter().find(|p| p.name == name)
}

pub fn find_by_id(products: &[Product], id: u32) -> Option<&Product> {
    products.iter().find(|p| p.id == id)
}

#[cfg(test)]
pub(crate) fn sample_products() -> Vec<Product> {
    vec![
        Product {
            id: 1,
            name: "Heavenly Hues".to_string(),
            category: "Dreamcatchers".to_string(),
            price: 2500,
            desc: "Pastel feathers on a woven ring.".to_string(),
            image: "images/heavenly_hues.png".to_string(),
        },
        Product {
            id: 2,
            name: "Midnight Bloom".to_string(),
            category: "Dreamcatchers".to_string(),
            price: 3200,
            desc: "Dark lace with silver beads.".to_string(),
            image: "images/midnight_bloom.png".to_string(),
        },
        Product {
            id: 3,
            name: "Moonlit Chime".to_string(),
            category: "Wind Chimes".to_string(),
            price: 1800,
            desc: "Bamboo tubes tuned to a minor chord.".to_string(),
            image: "images/moonlit_chime.png".to_string(),
        }
    ]
}
