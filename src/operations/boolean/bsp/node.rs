//! Binary space partitioning tree.
//!
//! Each node holds a splitting plane, the polygons lying in it, and the
//! subtrees in front of and behind it. Every traversal uses an explicit
//! stack, so deep trees (convex solids give one node per face) cannot
//! overflow the call stack.

use super::polygon::{Plane, Polygon};

#[derive(Debug, Default)]
pub(super) struct Node {
    plane: Option<Plane>,
    polygons: Vec<Polygon>,
    front: Option<Box<Node>>,
    back: Option<Box<Node>>,
}

impl Node {
    /// Builds a tree from polygons.
    pub fn new(polygons: Vec<Polygon>) -> Self {
        let mut node = Self::default();
        node.build(polygons);
        node
    }

    /// Inserts polygons, splitting them across existing planes.
    pub fn build(&mut self, polygons: Vec<Polygon>) {
        let mut stack: Vec<(&mut Node, Vec<Polygon>)> = vec![(self, polygons)];
        while let Some((node, polygons)) = stack.pop() {
            let Node {
                plane,
                polygons: coplanar,
                front,
                back,
            } = node;
            let Some(first) = polygons.first() else {
                continue;
            };
            let plane = *plane.get_or_insert(first.plane);

            let mut front_polys = Vec::new();
            let mut back_polys = Vec::new();
            let mut coplanar_back = Vec::new();
            for polygon in polygons {
                plane.split(
                    polygon,
                    coplanar,
                    &mut coplanar_back,
                    &mut front_polys,
                    &mut back_polys,
                );
            }
            coplanar.append(&mut coplanar_back);

            if !front_polys.is_empty() {
                stack.push((front.get_or_insert_with(Box::default).as_mut(), front_polys));
            }
            if !back_polys.is_empty() {
                stack.push((back.get_or_insert_with(Box::default).as_mut(), back_polys));
            }
        }
    }

    /// Turns solid space into empty space and vice versa.
    pub fn invert(&mut self) {
        let mut stack: Vec<&mut Node> = vec![self];
        while let Some(node) = stack.pop() {
            let Node {
                plane,
                polygons,
                front,
                back,
            } = node;
            for polygon in polygons.iter_mut() {
                polygon.flip();
            }
            if let Some(plane) = plane.as_mut() {
                plane.flip();
            }
            std::mem::swap(front, back);
            stack.extend(front.as_deref_mut());
            stack.extend(back.as_deref_mut());
        }
    }

    /// Removes the parts of `polygons` that lie inside this tree's solid.
    pub fn clip_polygons(&self, polygons: Vec<Polygon>) -> Vec<Polygon> {
        let mut result = Vec::new();
        let mut stack: Vec<(&Node, Vec<Polygon>)> = vec![(self, polygons)];
        while let Some((node, polygons)) = stack.pop() {
            let Some(plane) = node.plane else {
                result.extend(polygons);
                continue;
            };
            let mut front = Vec::new();
            let mut back = Vec::new();
            let mut coplanar_front = Vec::new();
            let mut coplanar_back = Vec::new();
            for polygon in polygons {
                plane.split(
                    polygon,
                    &mut coplanar_front,
                    &mut coplanar_back,
                    &mut front,
                    &mut back,
                );
            }
            front.append(&mut coplanar_front);
            back.append(&mut coplanar_back);

            match node.front.as_deref() {
                Some(child) => stack.push((child, front)),
                None => result.extend(front),
            }
            // Without a back subtree the back side is solid: drop them.
            if let Some(child) = node.back.as_deref() {
                stack.push((child, back));
            }
        }
        result
    }

    /// Clips every polygon of this tree against `other`.
    pub fn clip_to(&mut self, other: &Node) {
        let mut stack: Vec<&mut Node> = vec![self];
        while let Some(node) = stack.pop() {
            let Node {
                polygons,
                front,
                back,
                ..
            } = node;
            *polygons = other.clip_polygons(std::mem::take(polygons));
            stack.extend(front.as_deref_mut());
            stack.extend(back.as_deref_mut());
        }
    }

    /// All polygons in the tree.
    pub fn all_polygons(&self) -> Vec<Polygon> {
        let mut result = Vec::new();
        let mut stack: Vec<&Node> = vec![self];
        while let Some(node) = stack.pop() {
            result.extend(node.polygons.iter().cloned());
            stack.extend(node.front.as_deref());
            stack.extend(node.back.as_deref());
        }
        result
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        let mut stack: Vec<Box<Node>> = Vec::new();
        stack.extend(self.front.take());
        stack.extend(self.back.take());
        while let Some(mut node) = stack.pop() {
            stack.extend(node.front.take());
            stack.extend(node.back.take());
        }
    }
}
