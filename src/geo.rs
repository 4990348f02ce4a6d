//! Geographic aggregation: hub maps, route distances and the combined
//! geo bundle consumed by the map views.
//!
//! Route endpoints in the LSN data are labels, not coordinates; they are
//! resolved against the airport dimension by code or name. Unresolvable
//! endpoints drop the route from distance-based outputs only.

use crate::aggregate::ranking;
use crate::constants::EARTH_RADIUS_KM;
use crate::error::Result;
use crate::models::PreparedTable;
use crate::prepare::normalize::{has_column, has_columns};
use polars::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

/// Great-circle distance in kilometers between two WGS84 points.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Centroid and bounding box of the geolocated airports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoSummary {
    pub airport_count: usize,
    pub centroid_lat: f64,
    pub centroid_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Summarize the airport dimension's coordinates. `None` when no airport
/// carries both a latitude and a longitude.
pub fn geo_summary(dimension: &DataFrame) -> Result<Option<GeoSummary>> {
    let points = coordinate_pairs(dimension)?;
    if points.is_empty() {
        return Ok(None);
    }

    let count = points.len() as f64;
    let mut summary = GeoSummary {
        airport_count: points.len(),
        centroid_lat: points.iter().map(|p| p.0).sum::<f64>() / count,
        centroid_lon: points.iter().map(|p| p.1).sum::<f64>() / count,
        min_lat: f64::INFINITY,
        max_lat: f64::NEG_INFINITY,
        min_lon: f64::INFINITY,
        max_lon: f64::NEG_INFINITY,
    };
    for (lat, lon) in points {
        summary.min_lat = summary.min_lat.min(lat);
        summary.max_lat = summary.max_lat.max(lat);
        summary.min_lon = summary.min_lon.min(lon);
        summary.max_lon = summary.max_lon.max(lon);
    }
    Ok(Some(summary))
}

fn coordinate_pairs(df: &DataFrame) -> Result<Vec<(f64, f64)>> {
    if !has_columns(df, &["latitude", "longitude"]) {
        return Ok(Vec::new());
    }
    let lats = df.column("latitude")?.f64()?;
    let lons = df.column("longitude")?.f64()?;
    Ok(lats
        .into_iter()
        .zip(lons)
        .filter_map(|(lat, lon)| Some((lat?, lon?)))
        .collect())
}

/// Top airports by total passengers, with coordinates and labels joined in
/// from the dimension when available.
pub fn top_hubs(
    airports: &DataFrame,
    dimension: Option<&DataFrame>,
    top_n: usize,
) -> Result<DataFrame> {
    let ranked = ranking(airports, &["code_aeroport"], "passagers_total", top_n)?;
    let Some(dim) = dimension else {
        return Ok(ranked);
    };
    if ranked.height() == 0 || !has_column(dim, "code_aeroport") {
        return Ok(ranked);
    }

    let out = ranked
        .lazy()
        .join(
            dim.clone().lazy(),
            [col("code_aeroport")],
            [col("code_aeroport")],
            JoinArgs::new(JoinType::Left),
        )
        .collect()?;
    Ok(out)
}

/// Top undirected routes by total passengers.
pub fn top_busiest_routes(routes: &DataFrame, top_n: usize) -> Result<DataFrame> {
    ranking(routes, &["route_pair"], "lsn_pax", top_n)
}

/// Per-route great-circle distance and passenger volume. One row per
/// `route_pair` whose endpoints both resolve to airport coordinates.
pub fn route_distances(routes: &DataFrame, dimension: &DataFrame) -> Result<DataFrame> {
    if routes.height() == 0
        || !has_columns(routes, &["route_pair", "lsn_1", "lsn_2"])
        || !has_column(routes, "lsn_pax")
    {
        return Ok(DataFrame::default());
    }
    let lookup = coordinate_lookup(dimension)?;
    if lookup.is_empty() {
        return Ok(DataFrame::default());
    }

    let grouped = routes
        .clone()
        .lazy()
        .filter(col("route_pair").is_not_null())
        .group_by_stable([col("route_pair")])
        .agg([
            col("lsn_1").cast(DataType::String).first(),
            col("lsn_2").cast(DataType::String).first(),
            col("lsn_pax").sum(),
        ])
        .collect()?;

    let pairs = grouped.column("route_pair")?.str()?;
    let from = grouped.column("lsn_1")?.str()?;
    let to = grouped.column("lsn_2")?.str()?;
    let pax = grouped.column("lsn_pax")?.f64()?;

    let mut out_pairs: Vec<String> = Vec::new();
    let mut out_dists: Vec<f64> = Vec::new();
    let mut out_pax: Vec<f64> = Vec::new();
    for i in 0..grouped.height() {
        let (Some(pair), Some(a), Some(b)) = (pairs.get(i), from.get(i), to.get(i)) else {
            continue;
        };
        let (Some(&(lat1, lon1)), Some(&(lat2, lon2))) =
            (lookup.get(&normalize_label(a)), lookup.get(&normalize_label(b)))
        else {
            continue;
        };
        out_pairs.push(pair.to_string());
        out_dists.push(haversine_km(lat1, lon1, lat2, lon2));
        out_pax.push(pax.get(i).unwrap_or(0.0));
    }

    let out = DataFrame::new(vec![
        Column::new("route_pair".into(), out_pairs),
        Column::new("distance_km".into(), out_dists),
        Column::new("lsn_pax".into(), out_pax),
    ])?;
    Ok(out)
}

/// Coordinates keyed by airport code and by airport name, both normalized.
fn coordinate_lookup(dimension: &DataFrame) -> Result<HashMap<String, (f64, f64)>> {
    let mut lookup = HashMap::new();
    if !has_columns(dimension, &["latitude", "longitude"]) {
        return Ok(lookup);
    }
    let lats = dimension.column("latitude")?.f64()?;
    let lons = dimension.column("longitude")?.f64()?;

    for key_column in ["code_aeroport", "nom_aeroport", "ville"] {
        if !has_column(dimension, key_column) {
            continue;
        }
        let keys = dimension.column(key_column)?.str()?;
        for i in 0..dimension.height() {
            let (Some(key), Some(lat), Some(lon)) = (keys.get(i), lats.get(i), lons.get(i)) else {
                continue;
            };
            lookup.entry(normalize_label(key)).or_insert((lat, lon));
        }
    }
    Ok(lookup)
}

fn normalize_label(label: &str) -> String {
    label.trim().to_uppercase()
}

/// Top routes by great-circle distance, from a `route_distances` frame.
pub fn top_longest_routes(distances: &DataFrame, top_n: usize) -> Result<DataFrame> {
    if distances.height() == 0 {
        return Ok(DataFrame::default());
    }
    let out = distances
        .clone()
        .lazy()
        .sort(
            ["distance_km"],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .limit(top_n as IdxSize)
        .collect()?;
    Ok(out)
}

/// Passenger-weighted mean route distance. NaN when no route carries
/// passengers.
pub fn average_route_distance(distances: &DataFrame) -> Result<f64> {
    if distances.height() == 0 {
        return Ok(f64::NAN);
    }
    let dists = distances.column("distance_km")?.f64()?;
    let pax = distances.column("lsn_pax")?.f64()?;

    let mut weighted = 0.0;
    let mut weight = 0.0;
    for (d, p) in dists.into_iter().zip(pax) {
        if let (Some(d), Some(p)) = (d, p) {
            weighted += d * p;
            weight += p;
        }
    }
    if weight == 0.0 {
        return Ok(f64::NAN);
    }
    Ok(weighted / weight)
}

/// Everything the map views need, computed in one pass.
#[derive(Debug, Clone)]
pub struct GeoBundle {
    pub summary: Option<GeoSummary>,
    pub hubs: DataFrame,
    pub busiest_routes: DataFrame,
    pub longest_routes: DataFrame,
    pub average_distance_km: f64,
}

pub fn geo_bundle(
    airports: &PreparedTable,
    routes: &PreparedTable,
    top_n: usize,
) -> Result<GeoBundle> {
    let dimension = airports.dimension.as_ref();
    let summary = match dimension {
        Some(dim) => geo_summary(dim)?,
        None => None,
    };
    let hubs = top_hubs(&airports.data, dimension, top_n)?;
    let busiest_routes = top_busiest_routes(&routes.data, top_n)?;
    let (longest_routes, average_distance_km) = match dimension {
        Some(dim) => {
            let distances = route_distances(&routes.data, dim)?;
            let average = average_route_distance(&distances)?;
            (top_longest_routes(&distances, top_n)?, average)
        }
        None => (DataFrame::default(), f64::NAN),
    };

    Ok(GeoBundle {
        summary,
        hubs,
        busiest_routes,
        longest_routes,
        average_distance_km,
    })
}
