//! Anchor-based biome selection and height blending
//!
//! Anchors are laid out on a coarse grid around the viewer and carry climate
//! samples. A column picks its biome from the nearest anchor and blends its
//! ground level with the runner-up, which hides the seams between biomes.

use glam::{IVec2, Vec2, Vec3};
use rustc_hash::FxHashSet;

use crate::constants::BIOME_NEIGHBOR_SAMPLES;
use crate::error::{Error, Result};
use crate::utils::settings::{BiomeSettings, WorldSettings};
use crate::world::layers::LayerPipeline;
use crate::world::noise::{DomainWarp, NoiseField, redistribute, remap_to_range};

pub struct Biome {
    name: String,
    temperature: [f32; 2],
    precipitation: [f32; 2],
    height: NoiseField,
    use_domain_warp: bool,
    layers: LayerPipeline,
}

impl Biome {
    pub fn new(
        name: impl Into<String>,
        temperature: [f32; 2],
        precipitation: [f32; 2],
        height: NoiseField,
        use_domain_warp: bool,
        layers: LayerPipeline,
    ) -> Self {
        Biome {
            name: name.into(),
            temperature,
            precipitation,
            height,
            use_domain_warp,
            layers,
        }
    }

    pub fn from_settings(settings: &BiomeSettings, world: &WorldSettings) -> Self {
        Self::new(
            settings.name.clone(),
            settings.temperature,
            settings.precipitation,
            NoiseField::new(settings.height.reseeded(world.seed)),
            settings.use_domain_warp,
            LayerPipeline::for_biome(settings, world),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layers(&self) -> &LayerPipeline {
        &self.layers
    }

    /// Half-open range test on both climate scalars.
    pub fn matches(&self, temperature: f32, precipitation: f32) -> bool {
        in_range(temperature, self.temperature) && in_range(precipitation, self.precipitation)
    }

    /// Unclamped surface height of this biome alone at a world column.
    pub fn surface_height(&self, x: i32, z: i32, warp: &DomainWarp, chunk_height: i32) -> i32 {
        let (x, z) = (x as f32, z as f32);
        let value = if self.use_domain_warp {
            warp.warp(x, z, &self.height)
        } else {
            self.height.sample_octaves(x, z)
        };
        let params = self.height.params();
        let value = redistribute(value, params.modifier, params.plateau_exponent);
        remap_to_range(value, 0, chunk_height)
    }
}

fn in_range(value: f32, range: [f32; 2]) -> bool {
    value >= range[0] && value < range[1]
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiomeAnchor {
    pub position: IVec2,
    pub temperature: f32,
    pub precipitation: f32,
}

pub struct BiomeSelection<'a> {
    pub biome: &'a Biome,
    pub ground_level: i32,
}

pub struct BiomeMap {
    biomes: Vec<Biome>,
    warp: DomainWarp,
    temperature: NoiseField,
    precipitation: NoiseField,
    anchors: Vec<BiomeAnchor>,
}

impl BiomeMap {
    /// `biomes` is in priority order. The first one is the fallback, so the
    /// list must not be empty.
    pub fn new(
        biomes: Vec<Biome>,
        warp: DomainWarp,
        temperature: NoiseField,
        precipitation: NoiseField,
    ) -> Result<Self> {
        if biomes.is_empty() {
            return Err(Error::InvalidConfig(
                "biome map needs at least one biome".to_string(),
            ));
        }
        Ok(BiomeMap {
            biomes,
            warp,
            temperature,
            precipitation,
            anchors: Vec::new(),
        })
    }

    pub fn from_settings(settings: &WorldSettings) -> Result<Self> {
        settings.validate()?;
        let noise = &settings.noise;
        let biomes = settings
            .biomes
            .iter()
            .map(|biome| Biome::from_settings(biome, settings))
            .collect();
        Self::new(
            biomes,
            DomainWarp::new(
                settings.seeded(noise.warp_x),
                settings.seeded(noise.warp_z),
                noise.warp_amplitude_x,
                noise.warp_amplitude_z,
            ),
            NoiseField::new(settings.seeded(noise.temperature)),
            NoiseField::new(settings.seeded(noise.precipitation)),
        )
    }

    pub fn biomes(&self) -> &[Biome] {
        &self.biomes
    }

    pub fn anchors(&self) -> &[BiomeAnchor] {
        &self.anchors
    }

    pub fn set_anchors(&mut self, anchors: Vec<BiomeAnchor>) {
        self.anchors = anchors;
    }

    /// Replaces the anchor set for a viewer position. Positions are warped
    /// and deduplicated again after warping; climate is sampled once here.
    pub fn recompute_anchors(&mut self, viewer: Vec3, render_radius: i32, chunk_width: i32) {
        let mut seen = FxHashSet::default();
        let mut anchors = Vec::new();
        for position in anchor_positions(viewer, render_radius, chunk_width) {
            let warped = position + self.warp.int_offset(position.x, position.y);
            if !seen.insert(warped) {
                continue;
            }
            let (x, z) = (warped.x as f32, warped.y as f32);
            anchors.push(BiomeAnchor {
                position: warped,
                temperature: self.temperature.sample_octaves(x, z),
                precipitation: self.precipitation.sample_octaves(x, z),
            });
        }
        tracing::debug!("Recomputed {} biome anchors around {:?}", anchors.len(), viewer);
        self.anchors = anchors;
    }

    /// First biome whose ranges contain the anchor's climate, else the first biome.
    pub fn select_biome(&self, anchor: &BiomeAnchor) -> &Biome {
        self.biomes
            .iter()
            .find(|biome| biome.matches(anchor.temperature, anchor.precipitation))
            .unwrap_or(&self.biomes[0])
    }

    /// Up to four anchors nearest to `query`, closest first. Ties resolve by
    /// position so the result never depends on anchor order.
    fn nearest_anchors(&self, query: IVec2) -> Vec<(f32, BiomeAnchor)> {
        let query = query.as_vec2();
        let mut nearest: Vec<(f32, BiomeAnchor)> = self
            .anchors
            .iter()
            .map(|anchor| (anchor.position.as_vec2().distance(query), *anchor))
            .collect();
        nearest.sort_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then(a.1.position.x.cmp(&b.1.position.x))
                .then(a.1.position.y.cmp(&b.1.position.y))
        });
        nearest.truncate(BIOME_NEIGHBOR_SAMPLES);
        nearest
    }

    /// Biome and blended ground level for a world column. The column is
    /// warped first; anchors and biome heights are both looked up at the
    /// warped position. The ground is clamped into `[0, chunk_height)`.
    pub fn select_biome_and_ground(&self, column: IVec2, chunk_height: i32) -> BiomeSelection<'_> {
        let query = column + self.warp.int_offset(column.x, column.y);
        let nearest = self.nearest_anchors(query);
        let height_of =
            |biome: &Biome| biome.surface_height(query.x, query.y, &self.warp, chunk_height);

        let (biome, ground) = match nearest.as_slice() {
            [] => {
                let biome = &self.biomes[0];
                (biome, height_of(biome))
            }
            [(_, only)] => {
                let biome = self.select_biome(only);
                (biome, height_of(biome))
            }
            [(d0, first), (_, second), ..] => {
                let biome1 = self.select_biome(first);
                let biome2 = self.select_biome(second);
                let h1 = height_of(biome1);
                let spacing = first.position.as_vec2().distance(second.position.as_vec2());
                debug_assert!(spacing > f32::EPSILON, "coincident biome anchors");
                if spacing <= f32::EPSILON {
                    tracing::warn!("Coincident biome anchors at {:?}, skipping blend", first.position);
                    (biome1, h1)
                } else {
                    let h2 = height_of(biome2);
                    let weight1 = (d0 / spacing).clamp(0.0, 1.0);
                    let weight2 = 1.0 - weight1;
                    let blended = h1 as f32 * weight1 + h2 as f32 * weight2;
                    (biome1, blended.round() as i32)
                }
            }
        };

        BiomeSelection {
            biome,
            ground_level: ground.clamp(0, chunk_height - 1),
        }
    }
}

/// Coarse-cell anchor layout around the viewer, before warping: the cell
/// centre plus, for each of the 8 directions, offsets of one and two cells
/// along each axis. Deduplicated, in a fixed order.
pub fn anchor_positions(viewer: Vec3, render_radius: i32, chunk_width: i32) -> Vec<IVec2> {
    let size = (render_radius * chunk_width).max(1);
    let cell = Vec2::new(viewer.x, viewer.z) / size as f32;
    let centre = cell.round().as_ivec2() * size;

    let mut seen = FxHashSet::default();
    let mut positions = Vec::new();
    let mut push = |p: IVec2| {
        if seen.insert(p) {
            positions.push(p);
        }
    };

    push(centre);
    for dx in -1..=1 {
        for dz in -1..=1 {
            if dx == 0 && dz == 0 {
                continue;
            }
            push(centre + IVec2::new(dx, dz) * size);
            push(centre + IVec2::new(dx * 2, dz) * size);
            push(centre + IVec2::new(dx, dz * 2) * size);
            push(centre + IVec2::new(dx * 2, dz * 2) * size);
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::noise::NoiseParams;

    /// Biome with a constant height: `pow(0, 0) = 1` maps to the chunk top,
    /// `pow(0, 1) = 0` to the bottom.
    fn flat_biome(name: &str, temperature: [f32; 2], high: bool) -> Biome {
        let params = NoiseParams {
            modifier: 0.0,
            plateau_exponent: if high { 0.0 } else { 1.0 },
            ..NoiseParams::default()
        };
        Biome::new(
            name,
            temperature,
            [0.0, 1.0],
            NoiseField::new(params),
            false,
            LayerPipeline::new(),
        )
    }

    fn two_biome_map() -> BiomeMap {
        BiomeMap::new(
            vec![
                flat_biome("low", [0.0, 0.5], false),
                flat_biome("high", [0.5, 1.0], true),
            ],
            DomainWarp::identity(),
            NoiseField::new(NoiseParams::default()),
            NoiseField::new(NoiseParams::default()),
        )
        .unwrap()
    }

    fn anchor(x: i32, z: i32, temperature: f32) -> BiomeAnchor {
        BiomeAnchor {
            position: IVec2::new(x, z),
            temperature,
            precipitation: 0.5,
        }
    }

    #[test]
    fn test_anchor_layout_is_deduplicated() {
        let positions = anchor_positions(Vec3::ZERO, 2, 16);
        // Centre plus the 5x5 ring of cells at offsets one and two.
        assert_eq!(positions.len(), 25);
        assert_eq!(positions[0], IVec2::ZERO);
        let unique: FxHashSet<IVec2> = positions.iter().copied().collect();
        assert_eq!(unique.len(), positions.len());
        assert!(positions.contains(&IVec2::new(64, -32)));
        assert!(positions.contains(&IVec2::new(-64, -64)));
    }

    #[test]
    fn test_anchor_centre_snaps_to_cell() {
        let positions = anchor_positions(Vec3::new(40.0, 10.0, -20.0), 2, 16);
        assert_eq!(positions[0], IVec2::new(32, -32));
    }

    #[test]
    fn test_recompute_anchors_samples_climate() {
        let settings = WorldSettings::default();
        let mut map = BiomeMap::from_settings(&settings).unwrap();
        map.recompute_anchors(Vec3::ZERO, settings.render_radius, settings.chunk_width);
        assert!(!map.anchors().is_empty());
        let unique: FxHashSet<IVec2> = map.anchors().iter().map(|a| a.position).collect();
        assert_eq!(unique.len(), map.anchors().len());
        for anchor in map.anchors() {
            assert!((0.0..=1.0).contains(&anchor.temperature));
            assert!((0.0..=1.0).contains(&anchor.precipitation));
        }
    }

    #[test]
    fn test_select_biome_falls_back_to_first() {
        let map = two_biome_map();
        assert_eq!(map.select_biome(&anchor(0, 0, 0.2)).name(), "low");
        assert_eq!(map.select_biome(&anchor(0, 0, 0.7)).name(), "high");
        // 1.0 is outside every half-open range.
        assert_eq!(map.select_biome(&anchor(0, 0, 1.0)).name(), "low");
    }

    #[test]
    fn test_no_anchors_uses_first_biome() {
        let map = two_biome_map();
        let selection = map.select_biome_and_ground(IVec2::new(5, 5), 64);
        assert_eq!(selection.biome.name(), "low");
        assert_eq!(selection.ground_level, 0);
    }

    #[test]
    fn test_blend_continuity_across_bisector() {
        let mut map = two_biome_map();
        map.set_anchors(vec![anchor(0, 0, 0.2), anchor(100, 0, 0.7)]);

        let grounds: Vec<i32> = (0..=100)
            .map(|x| map.select_biome_and_ground(IVec2::new(x, 0), 64).ground_level)
            .collect();
        for pair in grounds.windows(2) {
            assert!((pair[1] - pair[0]).abs() <= 1, "height jump in {grounds:?}");
        }
        // Halfway between the anchors both biomes weigh in equally.
        assert_eq!(grounds[50], 32);
        assert_eq!(map.select_biome_and_ground(IVec2::new(40, 0), 64).biome.name(), "low");
        assert_eq!(map.select_biome_and_ground(IVec2::new(60, 0), 64).biome.name(), "high");
    }

    #[test]
    fn test_ground_is_clamped_to_chunk() {
        let mut map = two_biome_map();
        map.set_anchors(vec![anchor(0, 0, 0.7)]);
        let selection = map.select_biome_and_ground(IVec2::new(3, 3), 64);
        assert_eq!(selection.biome.name(), "high");
        assert_eq!(selection.ground_level, 63);
    }

    #[test]
    fn test_empty_biome_list_is_rejected() {
        let map = BiomeMap::new(
            Vec::new(),
            DomainWarp::identity(),
            NoiseField::new(NoiseParams::default()),
            NoiseField::new(NoiseParams::default()),
        );
        assert!(matches!(map, Err(Error::InvalidConfig(_))));

        let settings = WorldSettings {
            biomes: Vec::new(),
            ..WorldSettings::default()
        };
        assert!(BiomeMap::from_settings(&settings).is_err());
    }

    #[test]
    fn test_ground_is_sampled_at_warped_column() {
        let hills = NoiseParams {
            seed: 11,
            magnitude: 0.05,
            ..NoiseParams::default()
        };
        let warp = DomainWarp::new(
            NoiseParams::default().with_seed(3),
            NoiseParams::default().with_seed(4),
            30.0,
            30.0,
        );
        let mut map = BiomeMap::new(
            vec![Biome::new(
                "hills",
                [0.0, 1.0],
                [0.0, 1.0],
                NoiseField::new(hills),
                false,
                LayerPipeline::new(),
            )],
            warp.clone(),
            NoiseField::new(NoiseParams::default()),
            NoiseField::new(NoiseParams::default()),
        )
        .unwrap();
        map.set_anchors(vec![anchor(0, 0, 0.5)]);
        let biome = &map.biomes()[0];

        let mut moved = 0;
        for x in -40..40 {
            let column = IVec2::new(x * 3, 17 - x);
            let query = column + warp.int_offset(column.x, column.y);
            let expected = biome.surface_height(query.x, query.y, &warp, 64).clamp(0, 63);
            assert_eq!(map.select_biome_and_ground(column, 64).ground_level, expected);
            if biome.surface_height(column.x, column.y, &warp, 64) != expected {
                moved += 1;
            }
        }
        // The warp shifts enough columns onto a different height.
        assert!(moved > 0);
    }
}
