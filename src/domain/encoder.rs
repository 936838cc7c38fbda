//! Feature encoding. Must reproduce the training-time preprocessing exactly:
//! categorical codes pass through unscaled, counts and size go through log1p.
//! A mismatch here does not error, it silently skews every prediction.

use crate::domain::entities::{FeatureVector, PropertyInput};

/// Encode a finalized input into the fixed 7-column model row.
pub fn encode(input: &PropertyInput) -> FeatureVector {
    FeatureVector::new([
        f32::from(input.category.code()),
        f32::from(input.purpose.code()),
        f32::from(input.city_id),
        f32::from(input.region_id),
        log1p(f64::from(input.room_count)),
        log1p(f64::from(input.bathroom_count)),
        log1p(input.size_sqm),
    ])
}

/// `ln(1 + x)` in double precision, narrowed to the model's float32 input.
fn log1p(x: f64) -> f32 {
    x.ln_1p() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Category, Purpose};

    fn tunis_apartment() -> PropertyInput {
        PropertyInput {
            purpose: Purpose::Buy,
            category: Category::Apartment,
            city_id: 22,
            region_id: 14,
            room_count: 2,
            bathroom_count: 1,
            size_sqm: 80.0,
        }
    }

    #[test]
    fn encodes_in_training_order() {
        let v = encode(&tunis_apartment()).values();
        assert_eq!(&v[..4], &[0.0, 0.0, 22.0, 14.0]);
        assert!((v[4] - 3f64.ln() as f32).abs() < 1e-6);
        assert!((v[5] - 2f64.ln() as f32).abs() < 1e-6);
        assert!((v[6] - 81f64.ln() as f32).abs() < 1e-6);
    }

    #[test]
    fn categorical_fields_are_not_scaled() {
        let input = PropertyInput {
            purpose: Purpose::Rent,
            category: Category::HouseVilla,
            city_id: 19,
            region_id: 7,
            ..tunis_apartment()
        };
        let v = encode(&input).values();
        assert_eq!(&v[..4], &[5.0, 1.0, 19.0, 7.0]);
    }

    #[test]
    fn encoding_is_bit_identical_across_calls() {
        let input = tunis_apartment();
        let a = encode(&input).values().map(f32::to_bits);
        let b = encode(&input.clone()).values().map(f32::to_bits);
        assert_eq!(a, b);
    }
}
