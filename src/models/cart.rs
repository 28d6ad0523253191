use serde::{ Serialize, Deserialize };
use super::catalog::Product;

pub const MIN_QTY: u32 = 1;
pub const MAX_QTY: u32 = 10;

/// Clamp a single addition into the range the quantity stepper allows.
pub fn clamp_qty(qty: i64) -> u32 {
    qty.clamp(MIN_QTY as i64, MAX_QTY as i64) as u32
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: u32,
    pub name: String,
    pub price: u64,
    pub qty: u32,
    pub image: String,
}

impl CartLine {
    pub fn line_total(&self) -> u64 {
        self.price * (self.qty as u64)
    }
}

/// Session-scoped cart. At most one line per product id.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges into the existing line for `product.id`, otherwise appends.
    pub fn add(&mut self, product: &Product, qty: u32) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.id == product.id) {
            line.qty += qty;
            return;
        }
        self.lines.push(CartLine {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            qty,
            image: product.image.clone(),
        });
    }

    pub fn remove(&mut self, index: usize) -> Option<CartLine> {
        if index < self.lines.len() {
            Some(self.lines.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of quantities, shown on the cart badge.
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .map(|l| l.qty)
            .sum()
    }

    pub fn total(&self) -> u64 {
        self.lines
            .iter()
            .map(CartLine::line_total)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::sample_products;

    #[test]
    fn adding_same_product_twice_merges_quantities() {
        let products = sample_products();
        let mut cart = Cart::new();
        cart.add(&products[0], 2);
        cart.add(&products[0], 3);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].qty, 5);
    }

    #[test]
    fn remove_preserves_relative_order() {
        let products = sample_products();
        let mut cart = Cart::new();
        for p in &products {
            cart.add(p, 1);
        }
        let removed = cart.remove(1).unwrap();
        assert_eq!(removed.id, 2);
        let ids: Vec<u32> = cart
            .lines()
            .iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn remove_out_of_range_is_noop() {
        let products = sample_products();
        let mut cart = Cart::new();
        cart.add(&products[0], 1);
        assert!(cart.remove(4).is_none());
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn totals_and_counts() {
        let products = sample_products();
        let mut cart = Cart::new();
        cart.add(&products[0], 2);
        cart.add(&products[2], 1);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.total(), 2 * 2500 + 1800);
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), 0);
    }

    #[test]
    fn clamp_qty_bounds() {
        assert_eq!(clamp_qty(0), 1);
        assert_eq!(clamp_qty(-4), 1);
        assert_eq!(clamp_qty(7), 7);
        assert_eq!(clamp_qty(99), 10);
    }
}
