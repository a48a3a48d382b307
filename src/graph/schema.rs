// Kind hierarchy used for subtype-aware kind matching

use std::collections::HashMap;

/// Single-inheritance hierarchy of entity kinds
///
/// Kinds that were never declared are treated as roots of their own
/// hierarchy, so `is_a` still matches them against themselves.
#[derive(Debug, Clone, Default)]
pub struct KindSchema {
    /// lowercase kind -> lowercase parent kind
    parents: HashMap<String, String>,
}

impl KindSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hierarchy for building-model documents
    pub fn building() -> Self {
        let mut schema = Self::new();
        for (kind, parent) in [
            ("Object", "Root"),
            ("Relationship", "Root"),
            ("PropertyDefinition", "Root"),
            ("StructuralContext", "Object"),
            ("Project", "StructuralContext"),
            ("ProjectLibrary", "StructuralContext"),
            ("Product", "Object"),
            ("SpatialElement", "Product"),
            ("Site", "SpatialElement"),
            ("Building", "SpatialElement"),
            ("BuildingStorey", "SpatialElement"),
            ("Space", "SpatialElement"),
            ("Element", "Product"),
            ("BuildingElement", "Element"),
            ("Wall", "BuildingElement"),
            ("Slab", "BuildingElement"),
            ("Column", "BuildingElement"),
            ("Beam", "BuildingElement"),
            ("Door", "BuildingElement"),
            ("Window", "BuildingElement"),
            ("RepresentationContext", "RepresentationItem"),
            ("GeometricRepresentationContext", "RepresentationContext"),
            ("GeometricRepresentationSubContext", "GeometricRepresentationContext"),
            ("Representation", "RepresentationItem"),
            ("ShapeRepresentation", "Representation"),
            ("ProductDefinitionShape", "RepresentationItem"),
            ("GeometricItem", "RepresentationItem"),
            ("Point", "GeometricItem"),
            ("CartesianPoint", "Point"),
            ("Direction", "GeometricItem"),
            ("Placement", "GeometricItem"),
            ("Axis2Placement3D", "Placement"),
            ("LocalPlacement", "GeometricItem"),
            ("Polyline", "GeometricItem"),
            ("ExtrudedAreaSolid", "GeometricItem"),
            ("RelContainedInSpatialStructure", "Relationship"),
            ("RelAggregates", "Relationship"),
            ("PropertySet", "PropertyDefinition"),
        ] {
            schema.declare(kind, parent);
        }
        schema
    }

    pub fn with_subtype(mut self, kind: &str, parent: &str) -> Self {
        self.declare(kind, parent);
        self
    }

    /// Declare `kind` as a direct subtype of `parent`, replacing any earlier parent
    pub fn declare(&mut self, kind: &str, parent: &str) {
        self.parents
            .insert(kind.to_ascii_lowercase(), parent.to_ascii_lowercase());
    }

    /// Whether `kind` equals `ancestor` or inherits from it (case-insensitive)
    pub fn is_a(&self, kind: &str, ancestor: &str) -> bool {
        let ancestor = ancestor.to_ascii_lowercase();
        let mut current = kind.to_ascii_lowercase();
        // Bounded by the number of declarations so a cyclic declaration cannot hang
        for _ in 0..=self.parents.len() {
            if current == ancestor {
                return true;
            }
            match self.parents.get(&current) {
                Some(parent) => current = parent.clone(),
                None => return false,
            }
        }
        false
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}
