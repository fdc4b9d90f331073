/// Threshold ladders mapping metrics to labels
use crate::domain::{LifeType, PlanetType, Quantity, ResourceType};

/// Life ladder, highest threshold first
const LIFE_LADDER: [(f64, LifeType); 3] = [
    (80.0, LifeType::AdvancedLife),
    (60.0, LifeType::ComplexLife),
    (40.0, LifeType::MicrobialLife),
];

/// Score needed for complex resources. Habitability scores from realistic
/// flux medians stay far below this, so the upper tier rarely triggers.
pub const COMPLEX_RESOURCES_THRESHOLD: f64 = 5000.0;

pub fn life_type(habitability_score: f64) -> LifeType {
    LIFE_LADDER
        .iter()
        .find(|(threshold, _)| habitability_score >= *threshold)
        .map(|(_, label)| *label)
        .unwrap_or(LifeType::NoKnownLife)
}

pub fn resource_type(habitability_score: f64) -> ResourceType {
    if habitability_score >= COMPLEX_RESOURCES_THRESHOLD {
        ResourceType::ComplexResources
    } else {
        ResourceType::BasicResources
    }
}

/// Planet class from host star, orbit and amplitude; every conjunct must hold
pub fn planet_type(
    stellar_radius: impl Into<Quantity>,
    stellar_mass: impl Into<Quantity>,
    orbital_period: impl Into<Quantity>,
    amplitude: impl Into<Quantity>,
) -> PlanetType {
    let radius = stellar_radius.into().as_number();
    let mass = stellar_mass.into().as_number();
    let period = orbital_period.into().as_number();
    let amplitude = amplitude.into().as_number();

    if radius < 1.0 && mass < 1.0 && period < 10.0 && amplitude < 0.5 {
        PlanetType::RockyPlanet
    } else if radius > 1.0 && mass > 1.0 && period > 100.0 && amplitude > 1.0 {
        PlanetType::GasGiant
    } else {
        PlanetType::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring;

    #[test]
    fn test_life_type_boundaries_pick_higher_tier() {
        assert_eq!(life_type(80.0), LifeType::AdvancedLife);
        assert_eq!(life_type(60.0), LifeType::ComplexLife);
        assert_eq!(life_type(40.0), LifeType::MicrobialLife);
    }

    #[test]
    fn test_life_type_between_boundaries() {
        assert_eq!(life_type(1_000.0), LifeType::AdvancedLife);
        assert_eq!(life_type(79.999), LifeType::ComplexLife);
        assert_eq!(life_type(59.999), LifeType::MicrobialLife);
        assert_eq!(life_type(39.999), LifeType::NoKnownLife);
        assert_eq!(life_type(0.0), LifeType::NoKnownLife);
        assert_eq!(life_type(-5.0), LifeType::NoKnownLife);
    }

    #[test]
    fn test_life_type_nan_has_no_known_life() {
        assert_eq!(life_type(f64::NAN), LifeType::NoKnownLife);
    }

    #[test]
    fn test_resource_type_boundary() {
        assert_eq!(resource_type(5000.0), ResourceType::ComplexResources);
        assert_eq!(resource_type(4999.999), ResourceType::BasicResources);
        assert_eq!(resource_type(0.0), ResourceType::BasicResources);
    }

    #[test]
    fn test_resource_threshold_unreachable_for_realistic_flux() {
        // normalized flux sits near 1.0; even a median of 10 stays basic
        for amplitude in [0.0, 0.5, 1.0, 2.0, 10.0] {
            let trees = scoring::tree_count(50.0, amplitude);
            let score = scoring::habitability_score(trees, amplitude);
            assert_eq!(resource_type(score), ResourceType::BasicResources);
        }
    }

    #[test]
    fn test_ladders_cover_every_score() {
        let mut score = -100.0;
        while score < 6000.0 {
            let life = life_type(score);
            let expected_life = if score >= 80.0 {
                LifeType::AdvancedLife
            } else if score >= 60.0 {
                LifeType::ComplexLife
            } else if score >= 40.0 {
                LifeType::MicrobialLife
            } else {
                LifeType::NoKnownLife
            };
            assert_eq!(life, expected_life, "score {}", score);

            let resource = resource_type(score);
            assert_eq!(
                resource == ResourceType::ComplexResources,
                score >= 5000.0,
                "score {}",
                score
            );
            score += 2.5;
        }
    }

    #[test]
    fn test_rocky_planet() {
        assert_eq!(planet_type(0.5, 0.5, 5.0, 0.2), PlanetType::RockyPlanet);
    }

    #[test]
    fn test_gas_giant() {
        assert_eq!(planet_type(1.5, 2.0, 365.0, 1.5), PlanetType::GasGiant);
    }

    #[test]
    fn test_planet_type_partial_match_is_unknown() {
        // three rocky conjuncts hold, amplitude does not
        assert_eq!(planet_type(0.5, 0.5, 5.0, 1.5), PlanetType::Unknown);
        // three giant conjuncts hold, period does not
        assert_eq!(planet_type(1.5, 2.0, 50.0, 1.5), PlanetType::Unknown);
        assert_eq!(planet_type(1.5, 0.5, 5.0, 0.2), PlanetType::Unknown);
    }

    #[test]
    fn test_planet_type_strict_bounds() {
        assert_eq!(planet_type(1.0, 0.5, 5.0, 0.2), PlanetType::Unknown);
        assert_eq!(planet_type(1.0, 1.0, 100.0, 1.0), PlanetType::Unknown);
    }

    #[test]
    fn test_planet_type_with_units() {
        let radius = Quantity::WithUnit {
            value: 0.8,
            unit: "solRad".to_string(),
        };
        let mass = Quantity::WithUnit {
            value: 0.7,
            unit: "solMass".to_string(),
        };
        assert_eq!(planet_type(radius, mass, 3.2, 0.1), PlanetType::RockyPlanet);
    }
}
