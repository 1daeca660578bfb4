//! Weapon catalogue

use serde::{Deserialize, Serialize};
use std::fmt;

/// Weapons available to every combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    /// Wind-affected rocket, explodes on contact
    Bazooka,
    /// Fused grenade, ignores wind
    Grenade,
    /// Single precise shot
    Rifle,
    /// Short-range burst
    Uzi,
}

impl WeaponKind {
    pub const ALL: [WeaponKind; 4] = [
        WeaponKind::Bazooka,
        WeaponKind::Grenade,
        WeaponKind::Rifle,
        WeaponKind::Uzi,
    ];

    pub fn stats(self) -> WeaponStats {
        WeaponStats::for_kind(self)
    }

    /// Arcing explosive with the highest damage, used for panic shots
    pub fn heaviest_arcing() -> WeaponKind {
        Self::ALL
            .iter()
            .copied()
            .filter(|w| w.stats().is_area())
            .max_by(|a, b| a.stats().damage.total_cmp(&b.stats().damage))
            .unwrap_or(WeaponKind::Bazooka)
    }
}

impl fmt::Display for WeaponKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WeaponKind::Bazooka => "bazooka",
            WeaponKind::Grenade => "grenade",
            WeaponKind::Rifle => "rifle",
            WeaponKind::Uzi => "uzi",
        };
        f.write_str(name)
    }
}

/// How a weapon delivers damage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponClass {
    /// Ballistic projectile that explodes at its impact point
    Arcing,
    /// Instant ray, one bullet
    HitScan,
    /// Instant ray, several bullets
    Burst,
}

/// Weapon stats per kind
#[derive(Debug, Clone, Copy)]
pub struct WeaponStats {
    pub class: WeaponClass,
    /// Damage at the explosion center, or per bullet
    pub damage: f32,
    /// Explosion radius (0 for hit-scan)
    pub explosion_radius: f32,
    /// Launch speed at full power (world units per second)
    pub max_speed: f32,
    /// Fraction of wind acceleration applied in flight
    pub wind_influence: f32,
    /// Maximum flight time before detonation (seconds)
    pub fuse: f32,
    /// Whether the projectile detonates on contact with a combatant
    pub direct_hit: bool,
    /// Projectile hitbox radius
    pub projectile_radius: f32,
    /// Ray length for hit-scan weapons
    pub range: f32,
    /// Bullets per trigger pull
    pub burst_count: u32,
}

impl WeaponStats {
    pub fn for_kind(kind: WeaponKind) -> Self {
        match kind {
            WeaponKind::Bazooka => Self {
                class: WeaponClass::Arcing,
                damage: 50.0,
                explosion_radius: 60.0,
                max_speed: 900.0,
                wind_influence: 1.0,
                fuse: 6.0,
                direct_hit: true,
                projectile_radius: 4.0,
                range: 0.0,
                burst_count: 1,
            },
            WeaponKind::Grenade => Self {
                class: WeaponClass::Arcing,
                damage: 45.0,
                explosion_radius: 55.0,
                max_speed: 750.0,
                wind_influence: 0.0,
                fuse: 3.0,
                direct_hit: false,
                projectile_radius: 4.0,
                range: 0.0,
                burst_count: 1,
            },
            WeaponKind::Rifle => Self {
                class: WeaponClass::HitScan,
                damage: 35.0,
                explosion_radius: 0.0,
                max_speed: 0.0,
                wind_influence: 0.0,
                fuse: 0.0,
                direct_hit: true,
                projectile_radius: 1.0,
                range: 900.0,
                burst_count: 1,
            },
            WeaponKind::Uzi => Self {
                class: WeaponClass::Burst,
                damage: 7.0,
                explosion_radius: 0.0,
                max_speed: 0.0,
                wind_influence: 0.0,
                fuse: 0.0,
                direct_hit: true,
                projectile_radius: 1.0,
                range: 600.0,
                burst_count: 10,
            },
        }
    }

    /// Explosive weapons score by impact point and can hurt the shooter
    pub fn is_area(&self) -> bool {
        self.class == WeaponClass::Arcing
    }

    pub fn is_hit_scan(&self) -> bool {
        !self.is_area()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bazooka_is_the_heaviest_arcing_weapon() {
        assert_eq!(WeaponKind::heaviest_arcing(), WeaponKind::Bazooka);
    }

    #[test]
    fn hit_scan_weapons_have_no_blast() {
        for kind in [WeaponKind::Rifle, WeaponKind::Uzi] {
            let stats = kind.stats();
            assert!(stats.is_hit_scan());
            assert_eq!(stats.explosion_radius, 0.0);
        }
    }
}
