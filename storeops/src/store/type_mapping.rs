use crate::errors::{ErrorKind, OpsError, OpsResult};
use crate::operation::{DeleteResolver, DeleteResult, Entity, PutResolver, PutResult, Resolver};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// Default resolvers for one entity type, registered on a [`Store`](crate::store::Store).
///
/// Operations fall back to these when they were prepared without an
/// explicit resolver.
pub struct TypeMapping<T> {
    delete_resolver: Option<DeleteResolver<T>>,
    put_resolver: Option<PutResolver<T>>,
}

impl<T> Clone for TypeMapping<T> {
    fn clone(&self) -> Self {
        TypeMapping {
            delete_resolver: self.delete_resolver.clone(),
            put_resolver: self.put_resolver.clone(),
        }
    }
}

impl<T: Entity> TypeMapping<T> {
    pub fn builder() -> TypeMappingBuilder<T> {
        TypeMappingBuilder {
            delete_resolver: None,
            put_resolver: None,
        }
    }

    pub fn delete_resolver(&self) -> Option<DeleteResolver<T>> {
        self.delete_resolver.clone()
    }

    pub fn put_resolver(&self) -> Option<PutResolver<T>> {
        self.put_resolver.clone()
    }
}

pub struct TypeMappingBuilder<T> {
    delete_resolver: Option<DeleteResolver<T>>,
    put_resolver: Option<PutResolver<T>>,
}

impl<T: Entity> TypeMappingBuilder<T> {
    pub fn delete_resolver(mut self, resolver: impl Resolver<T, Outcome = DeleteResult> + 'static) -> Self {
        self.delete_resolver = Some(Arc::new(resolver));
        self
    }

    pub fn put_resolver(mut self, resolver: impl Resolver<T, Outcome = PutResult> + 'static) -> Self {
        self.put_resolver = Some(Arc::new(resolver));
        self
    }

    /// Fails with `ConfigurationError` if no resolver was set.
    pub fn build(self) -> OpsResult<TypeMapping<T>> {
        if self.delete_resolver.is_none() && self.put_resolver.is_none() {
            return Err(OpsError::new(
                &format!(
                    "Type mapping for {} needs at least one resolver",
                    std::any::type_name::<T>()
                ),
                ErrorKind::ConfigurationError,
            ));
        }
        Ok(TypeMapping {
            delete_resolver: self.delete_resolver,
            put_resolver: self.put_resolver,
        })
    }
}

/// Type mappings keyed by entity type. Filled while building a store and
/// read-only afterwards.
#[derive(Default)]
pub(crate) struct TypeMappingRegistry {
    mappings: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl TypeMappingRegistry {
    pub(crate) fn register<T: Entity>(&mut self, mapping: TypeMapping<T>) -> OpsResult<()> {
        let type_id = TypeId::of::<T>();
        if self.mappings.contains_key(&type_id) {
            return Err(OpsError::new(
                &format!(
                    "Type mapping for {} is already registered",
                    std::any::type_name::<T>()
                ),
                ErrorKind::ConfigurationError,
            ));
        }
        self.mappings.insert(type_id, Box::new(mapping));
        Ok(())
    }

    pub(crate) fn get<T: Entity>(&self) -> Option<&TypeMapping<T>> {
        self.mappings
            .get(&TypeId::of::<T>())
            .and_then(|mapping| mapping.downcast_ref::<TypeMapping<T>>())
    }

    pub(crate) fn len(&self) -> usize {
        self.mappings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedResolver;

    #[test]
    fn test_build_without_resolver_fails() {
        let err = TypeMapping::<String>::builder().build().err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ConfigurationError);
    }

    #[test]
    fn test_registry_lookup_by_type() {
        let mut registry = TypeMappingRegistry::default();
        let mapping = TypeMapping::<String>::builder()
            .delete_resolver(ScriptedResolver::new())
            .build()
            .unwrap();
        registry.register(mapping).unwrap();

        assert!(registry.get::<String>().is_some());
        assert!(registry.get::<u64>().is_none());
        assert!(registry.get::<String>().unwrap().put_resolver().is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = TypeMappingRegistry::default();
        let mapping = TypeMapping::<String>::builder()
            .delete_resolver(ScriptedResolver::new())
            .build()
            .unwrap();
        registry.register(mapping.clone()).unwrap();
        let err = registry.register(mapping).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ConfigurationError);
    }
}
