//! Order arithmetic shared by order creation and order updates: tier
//! pricing, coupon discounts, shipping zones and stock restoration.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    entity::{baladias, coupons, order_items, wilayas},
    models::PriceTier,
};

/// Unit price for `qty` units: the tier with the largest threshold not above
/// `qty`, falling back to the base price.
pub fn unit_price(base_price: i64, tiers: &[PriceTier], qty: i32) -> i64 {
    tiers
        .iter()
        .filter(|tier| tier.qty <= qty)
        .max_by_key(|tier| tier.qty)
        .map(|tier| tier.price)
        .unwrap_or(base_price)
}

pub fn validate_tiers(tiers: &[PriceTier]) -> Result<(), String> {
    let mut seen = HashSet::new();
    for tier in tiers {
        if tier.qty <= 0 {
            return Err("Price tier quantity must be greater than 0".into());
        }
        if tier.price < 0 {
            return Err("Price tier price must not be negative".into());
        }
        if !seen.insert(tier.qty) {
            return Err(format!("Duplicate price tier for quantity {}", tier.qty));
        }
    }
    Ok(())
}

/// `None` when the line does not fit in an `i64`.
pub fn line_total(unit_price: i64, quantity: i32) -> Option<i64> {
    unit_price.checked_mul(i64::from(quantity))
}

/// Percentage discount on one line, rounded down to whole dinars. Split
/// into hundreds and remainder so large totals cannot overflow.
pub fn line_discount(line_total: i64, percent: i32) -> i64 {
    let percent = i64::from(percent.clamp(0, 100));
    line_total / 100 * percent + line_total % 100 * percent / 100
}

/// A coupon without linked products applies to every line.
pub fn coupon_applies(linked_products: &HashSet<Uuid>, product_id: Uuid) -> bool {
    linked_products.is_empty() || linked_products.contains(&product_id)
}

pub fn ensure_coupon_usable(coupon: &coupons::Model, now: DateTime<Utc>) -> Result<(), String> {
    if !coupon.is_active {
        return Err(format!("Coupon {} is not active", coupon.code));
    }
    if let Some(expires_at) = coupon.expires_at {
        if expires_at.with_timezone(&Utc) <= now {
            return Err(format!("Coupon {} has expired", coupon.code));
        }
    }
    Ok(())
}

pub fn normalize_coupon_code(code: &str) -> String {
    code.trim().to_uppercase()
}

pub fn validate_discount(discount: i32) -> Result<(), String> {
    if (0..=100).contains(&discount) {
        Ok(())
    } else {
        Err("Discount must be between 0 and 100".into())
    }
}

/// Door delivery uses the wilaya's home price when one is configured.
pub fn shipping_cost(wilaya: Option<&wilayas::Model>, house: bool) -> i64 {
    match wilaya {
        None => 0,
        Some(w) if house => w.home_delivery_price.unwrap_or(w.delivery_price),
        Some(w) => w.delivery_price,
    }
}

pub fn order_total(subtotal: i64, discount: i64, shipping: i64) -> Option<i64> {
    subtotal.saturating_sub(discount).max(0).checked_add(shipping)
}

/// When communes are registered for the wilaya the name must match one of
/// them (French or Arabic spelling); otherwise any non-empty name passes.
pub fn baladia_matches(registered: &[baladias::Model], name: &str) -> bool {
    let name = name.trim();
    if name.is_empty() {
        return false;
    }
    if registered.is_empty() {
        return true;
    }
    registered.iter().any(|b| {
        b.name.eq_ignore_ascii_case(name)
            || b.ar_name.as_deref().is_some_and(|ar| ar.trim() == name)
    })
}

/// Merge repeated product lines, keeping the first-seen order.
pub fn merge_lines(lines: &[(Uuid, i32)]) -> Result<Vec<(Uuid, i32)>, String> {
    if lines.is_empty() {
        return Err("Order must contain at least one item".into());
    }
    let mut merged: Vec<(Uuid, i32)> = Vec::with_capacity(lines.len());
    for &(product_id, quantity) in lines {
        if quantity <= 0 {
            return Err("Item quantity must be greater than 0".into());
        }
        match merged.iter_mut().find(|(id, _)| *id == product_id) {
            Some((_, existing)) => {
                *existing = existing
                    .checked_add(quantity)
                    .ok_or_else(|| "Item quantity is too large".to_string())?;
            }
            None => merged.push((product_id, quantity)),
        }
    }
    Ok(merged)
}

/// Units to hand back to each product when an order's items are released.
pub fn restock_plan(items: &[order_items::Model]) -> HashMap<Uuid, i32> {
    let mut plan: HashMap<Uuid, i32> = HashMap::new();
    for item in items {
        *plan.entry(item.product_id).or_default() += item.quantity;
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn wilaya(delivery: i64, home: Option<i64>) -> wilayas::Model {
        let now = Utc::now().fixed_offset();
        wilayas::Model {
            id: Uuid::new_v4(),
            name: "Blida".into(),
            wilaya_number: 9,
            delivery_price: delivery,
            home_delivery_price: home,
            agency_name: "Yalidine".into(),
            created_at: now,
            updated_at: now,
        }
    }

    fn coupon(active: bool, expires_in: Option<Duration>) -> coupons::Model {
        let now = Utc::now();
        coupons::Model {
            id: Uuid::new_v4(),
            code: "SPRING".into(),
            discount: 10,
            is_active: active,
            expires_at: expires_in.map(|d| (now + d).fixed_offset()),
            created_at: now.fixed_offset(),
            updated_at: now.fixed_offset(),
        }
    }

    fn baladia(name: &str, ar: Option<&str>) -> baladias::Model {
        baladias::Model {
            id: Uuid::new_v4(),
            wilaya_number: 9,
            name: name.into(),
            ar_name: ar.map(str::to_string),
        }
    }

    #[test]
    fn highest_reached_tier_wins() {
        let tiers = vec![
            PriceTier { qty: 10, price: 700 },
            PriceTier { qty: 3, price: 900 },
        ];
        assert_eq!(unit_price(1000, &tiers, 1), 1000);
        assert_eq!(unit_price(1000, &tiers, 3), 900);
        assert_eq!(unit_price(1000, &tiers, 9), 900);
        assert_eq!(unit_price(1000, &tiers, 25), 700);
    }

    #[test]
    fn tiers_reject_duplicates_and_non_positive_quantities() {
        assert!(validate_tiers(&[PriceTier { qty: 2, price: 5 }, PriceTier { qty: 2, price: 4 }]).is_err());
        assert!(validate_tiers(&[PriceTier { qty: 0, price: 5 }]).is_err());
        assert!(validate_tiers(&[PriceTier { qty: 1, price: -1 }]).is_err());
        assert!(validate_tiers(&[PriceTier { qty: 1, price: 0 }]).is_ok());
    }

    #[test]
    fn discount_rounds_down() {
        assert_eq!(line_discount(999, 10), 99);
        assert_eq!(line_discount(1000, 0), 0);
        assert_eq!(line_discount(1000, 100), 1000);
        assert_eq!(line_discount(1050, 33), 346);
    }

    #[test]
    fn huge_lines_do_not_overflow() {
        let big = 100_000_000_000_000_000;
        assert_eq!(line_discount(big, 100), big);
        assert_eq!(line_discount(i64::MAX, 50), i64::MAX / 2);
        assert_eq!(line_total(4_000_000_000_000_000_000, 3), None);
        assert_eq!(line_total(900, 3), Some(2700));
        assert_eq!(order_total(i64::MAX, 0, 1), None);
    }

    #[test]
    fn coupon_without_products_covers_everything() {
        let product = Uuid::new_v4();
        assert!(coupon_applies(&HashSet::new(), product));
        let linked: HashSet<Uuid> = [Uuid::new_v4()].into_iter().collect();
        assert!(!coupon_applies(&linked, product));
    }

    #[test]
    fn inactive_or_expired_coupons_are_refused() {
        let now = Utc::now();
        assert!(ensure_coupon_usable(&coupon(true, None), now).is_ok());
        assert!(ensure_coupon_usable(&coupon(true, Some(Duration::days(1))), now).is_ok());
        assert!(ensure_coupon_usable(&coupon(false, None), now).is_err());
        assert!(ensure_coupon_usable(&coupon(true, Some(Duration::days(-1))), now).is_err());
    }

    #[test]
    fn coupon_codes_are_uppercased_and_discounts_bounded() {
        assert_eq!(normalize_coupon_code("  spring25 "), "SPRING25");
        assert!(validate_discount(0).is_ok());
        assert!(validate_discount(100).is_ok());
        assert!(validate_discount(101).is_err());
        assert!(validate_discount(-5).is_err());
    }

    #[test]
    fn house_delivery_uses_home_price_when_set() {
        let with_home = wilaya(400, Some(650));
        let office_only = wilaya(400, None);
        assert_eq!(shipping_cost(Some(&with_home), false), 400);
        assert_eq!(shipping_cost(Some(&with_home), true), 650);
        assert_eq!(shipping_cost(Some(&office_only), true), 400);
        assert_eq!(shipping_cost(None, true), 0);
    }

    #[test]
    fn total_adds_shipping_after_discount() {
        assert_eq!(order_total(5000, 500, 400), Some(4900));
        assert_eq!(order_total(100, 100, 300), Some(300));
    }

    #[test]
    fn baladia_must_match_when_communes_are_registered() {
        let registered = vec![baladia("Boufarik", Some("بوفاريك")), baladia("Mouzaia", None)];
        assert!(baladia_matches(&registered, "boufarik"));
        assert!(baladia_matches(&registered, "بوفاريك"));
        assert!(!baladia_matches(&registered, "Oran"));
        assert!(baladia_matches(&[], "Anything"));
        assert!(!baladia_matches(&[], "  "));
    }

    #[test]
    fn duplicate_lines_are_merged() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let merged = merge_lines(&[(a, 1), (b, 2), (a, 3)]).expect("valid lines");
        assert_eq!(merged, vec![(a, 4), (b, 2)]);
        assert!(merge_lines(&[]).is_err());
        assert!(merge_lines(&[(a, 0)]).is_err());
    }

    #[test]
    fn restock_plan_sums_quantities_per_product() {
        let order_id = Uuid::new_v4();
        let fern = Uuid::new_v4();
        let pot = Uuid::new_v4();
        let item = |product_id, quantity| order_items::Model {
            id: Uuid::new_v4(),
            order_id,
            product_id,
            quantity,
            price: 100,
        };
        let plan = restock_plan(&[item(fern, 2), item(pot, 1), item(fern, 3)]);
        assert_eq!(plan.get(&fern), Some(&5));
        assert_eq!(plan.get(&pot), Some(&1));
        assert_eq!(plan.len(), 2);
    }
}
