use super::VisitMut;
use hcl_edit::structure::{Attribute, Body, Structure};

/// Recursively visit all [Attribute]s mutably, including those of nested blocks
pub trait VisitAttributesMut {
    fn visit_attributes_mut(&mut self, visitor: &mut dyn VisitMut<Attribute>);
}

impl VisitAttributesMut for Body {
    fn visit_attributes_mut(&mut self, visitor: &mut dyn VisitMut<Attribute>) {
        for index in 0..self.len() {
            let mut structure = self.remove(index);
            match &mut structure {
                Structure::Attribute(attr) => visitor.visit_mut(attr),
                Structure::Block(block) => block.body.visit_attributes_mut(visitor),
            }
            self.insert(index, structure);
        }
    }
}
