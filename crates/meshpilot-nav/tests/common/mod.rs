#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use meshpilot_nav::{EventBus, NavEvent, NavMesh, Polygon};

pub fn tri(coords: [(f64, f64); 3]) -> Polygon {
    Polygon::from_coords(coords).expect("valid triangle")
}

pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Polygon {
    Polygon::from_coords([(x0, y0), (x1, y0), (x1, y1), (x0, y1)]).expect("valid rectangle")
}

/// A(0,0)-(5,0)-(0,5), B(5,0)-(10,0)-(5,5), C(10,0)-(10,5)-(5,5).
pub fn three_triangles() -> NavMesh {
    let mut mesh = NavMesh::new();
    for poly in [
        tri([(0.0, 0.0), (5.0, 0.0), (0.0, 5.0)]),
        tri([(5.0, 0.0), (10.0, 0.0), (5.0, 5.0)]),
        tri([(10.0, 0.0), (10.0, 5.0), (5.0, 5.0)]),
    ] {
        mesh.add_polygon(poly).expect("default layer");
    }
    mesh
}

/// Two right triangles sharing the hypotenuse (0,10)-(10,0).
pub fn hypotenuse_pair() -> NavMesh {
    let mut mesh = NavMesh::new();
    mesh.add_polygon(tri([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]))
        .expect("a");
    mesh.add_polygon(tri([(10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]))
        .expect("b");
    mesh.build_graph();
    mesh
}

/// `n` 2x2 squares in a row; node `i` spans x in [2i, 2i+2], centroid (2i+1, 1).
pub fn corridor(n: usize) -> NavMesh {
    let mut mesh = NavMesh::new();
    for i in 0..n {
        let x = 2.0 * i as f64;
        mesh.add_polygon(rect(x, 0.0, x + 2.0, 2.0)).expect("square");
    }
    mesh.build_graph();
    mesh
}

/// `cols` x `rows` grid of 2x2 squares; node id is `row * cols + col`.
/// Squares touching only at a corner are adjacent too.
pub fn grid(cols: usize, rows: usize) -> NavMesh {
    let mut mesh = NavMesh::new();
    for row in 0..rows {
        for col in 0..cols {
            let (x, y) = (2.0 * col as f64, 2.0 * row as f64);
            mesh.add_polygon(rect(x, y, x + 2.0, y + 2.0)).expect("cell");
        }
    }
    mesh.build_graph();
    mesh
}

pub fn record(bus: &mut EventBus) -> Arc<Mutex<Vec<NavEvent>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    bus.on_any(move |event| sink.lock().expect("event log").push(event.clone()));
    log
}
