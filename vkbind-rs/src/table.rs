//! Building tables of resolved entry points
//!
//! Tables are all-or-nothing: every symbol is resolved before the table value
//! exists, so a table that was handed out never has a missing entry.

use std::collections::BTreeMap;

use crate::library::{LibraryHandle, SymbolAddress};
use crate::Result;

/// Maps an export name to its address.
pub trait Resolve {
    fn resolve(&self, symbol: &str) -> Result<SymbolAddress>;
}

impl Resolve for LibraryHandle {
    fn resolve(&self, symbol: &str) -> Result<SymbolAddress> {
        LibraryHandle::resolve(self, symbol)
    }
}

/// A fixed set of entry points resolved together.
///
/// Usually declared with [`function_table!`](crate::function_table).
pub trait FunctionTable: Sized {
    /// Export names, in field order.
    const SYMBOLS: &'static [&'static str];

    fn load(resolver: &dyn Resolve) -> Result<Self>;
}

/// Resolves every entry of `T`, failing on the first missing symbol.
pub fn build<T: FunctionTable>(resolver: &dyn Resolve) -> Result<T> {
    log::debug!(
        "building {} ({} entry points)",
        std::any::type_name::<T>(),
        T::SYMBOLS.len()
    );
    T::load(resolver)
}

/// Name-keyed table for symbol lists only known at runtime.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: BTreeMap<String, SymbolAddress>,
}

impl SymbolTable {
    pub fn build<I, S>(resolver: &dyn Resolve, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = BTreeMap::new();
        for name in names {
            let name = name.as_ref();
            entries.insert(name.to_string(), resolver.resolve(name)?);
        }
        Ok(Self { entries })
    }

    pub fn get(&self, name: &str) -> Option<SymbolAddress> {
        self.entries.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SymbolAddress)> + '_ {
        self.entries.iter().map(|(name, address)| (name.as_str(), *address))
    }
}

/// Declares a struct of typed function pointers and its [`FunctionTable`] impl.
///
/// ```ignore
/// vkbind_rs::function_table! {
///     pub struct ExampleTable {
///         example_fn: unsafe extern "C" fn() -> i32 = "exampleFn",
///     }
/// }
/// ```
#[macro_export]
macro_rules! function_table {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field:ident : $ty:ty = $symbol:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Copy, Clone)]
        $vis struct $name {
            $(
                $(#[$field_meta])*
                pub $field: $ty,
            )+
        }

        impl $crate::FunctionTable for $name {
            const SYMBOLS: &'static [&'static str] = &[$($symbol),+];

            fn load(resolver: &dyn $crate::Resolve) -> $crate::Result<Self> {
                Ok(Self {
                    $(
                        // The declared type is the export's published signature.
                        $field: unsafe { resolver.resolve($symbol)?.cast::<$ty>() },
                    )+
                })
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(stringify!($name))
                    $(.field(stringify!($field), &(self.$field as *const ())))+
                    .finish()
            }
        }
    };
}
