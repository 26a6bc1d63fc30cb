//! Declarative macros for typed packed states.

/// Declares a fieldless enum that can be stored in a packed field.
///
/// The macro derives `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq` and `Hash`
/// and implements [`PackedEnum`](crate::PackedEnum) and
/// [`FieldType`](crate::FieldType). Members are stored by declaration index,
/// so reordering them changes the encoding.
///
/// ```
/// packstate_state::packed_enum! {
///     pub enum Thing { Foo, Bar, Baz, Quux }
/// }
///
/// use packstate_state::PackedEnum;
/// assert_eq!(Thing::Baz.ordinal(), 2);
/// assert_eq!(Thing::from_ordinal(3), Some(Thing::Quux));
/// ```
#[macro_export]
macro_rules! packed_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant
            ),+
        }

        impl $crate::PackedEnum for $name {
            const MEMBERS: &'static [Self] = &[$(Self::$variant),+];

            fn ordinal(self) -> u32 {
                self as u32
            }

            fn member_name(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),+
                }
            }
        }

        impl $crate::FieldType for $name {
            fn value_kind() -> $crate::ValueKind {
                <Self as $crate::PackedEnum>::enum_kind()
            }

            fn into_field_value(self) -> $crate::FieldValue {
                $crate::FieldValue::Enum($crate::PackedEnum::ordinal(self))
            }

            fn from_field_value(value: $crate::FieldValue) -> Self {
                match value {
                    $crate::FieldValue::Enum(ordinal) => {
                        match <Self as $crate::PackedEnum>::from_ordinal(ordinal) {
                            Some(member) => member,
                            None => panic!("{} has no member #{}", stringify!($name), ordinal),
                        }
                    }
                    other => $crate::__private::mismatch(stringify!($name), other),
                }
            }
        }
    };
}

/// Declares a typed packed state.
///
/// Each field names a type implementing [`FieldType`](crate::FieldType):
/// `bool`, `i8`, `i16`, `i32`, `i64` or an enum declared with
/// [`packed_enum!`](crate::packed_enum). Integer fields may add an inclusive
/// range with `in MIN..=MAX`, which packs them into just enough bits for the
/// span. Adding `with change_support` after the name allows holders of the
/// state to carry a change listener.
///
/// The macro generates a newtype over [`PackedState`](crate::PackedState)
/// with a getter and a `with_<field>` setter per field, plus `initial`,
/// `from_raw`, `value`, `layout` and `into_state`. Field names must not
/// collide with those.
///
/// ```
/// packstate_state::packed_enum! {
///     pub enum Thing { Foo, Bar, Baz, Quux }
/// }
///
/// packstate_state::packed_state! {
///     pub struct Person {
///         age: i32 in 0..=120,
///         is_cool: bool,
///         thing: Thing,
///     }
/// }
///
/// let p = Person::initial().with_age(30)?.with_thing(Thing::Baz)?;
/// assert_eq!(p.age(), 30);
/// assert_eq!(p.thing(), Thing::Baz);
/// assert!(!p.is_cool());
/// assert_eq!(Person::layout().total_bits(), 10);
/// assert!(p.with_age(121).is_err());
/// # Ok::<(), packstate_state::StateError>(())
/// ```
///
/// # Panics
///
/// The layout is planned on first use. A declaration that cannot be packed,
/// such as one needing more than 64 bits or with a contradictory range,
/// panics at that point.
#[macro_export]
macro_rules! packed_state {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident $(with $flag:ident)? {
            $(
                $(#[$fmeta:meta])*
                $field:ident : $ty:ident $(in $min:literal ..= $max:literal)?
            ),* $(,)?
        }
    ) => {
        $crate::__private::paste! {
            $(#[$meta])*
            #[derive(Clone, PartialEq, Eq, Hash)]
            $vis struct $name($crate::PackedState);

            #[allow(non_camel_case_types, dead_code)]
            #[derive(Clone, Copy)]
            enum [<__ $name Field>] {
                $($field),*
            }

            impl $name {
                /// Layout shared by every value of this state.
                $vis fn layout() -> &'static ::std::sync::Arc<$crate::BitLayoutPlan> {
                    static LAYOUT: ::std::sync::OnceLock<::std::sync::Arc<$crate::BitLayoutPlan>> =
                        ::std::sync::OnceLock::new();
                    LAYOUT.get_or_init(|| {
                        let schema = $crate::StateSchema::new(stringify!($name))
                            .with_change_support($crate::__change_support!($($flag)?))
                            $(
                                .field({
                                    let descriptor = $crate::FieldDescriptor::new(
                                        stringify!($field),
                                        <$ty as $crate::FieldType>::value_kind(),
                                    );
                                    $(
                                        let descriptor =
                                            descriptor.with_range($crate::ValueRange::new($min, $max));
                                    )?
                                    descriptor
                                })
                            )*;
                        match $crate::BitLayoutPlan::plan(&schema) {
                            Ok(plan) => ::std::sync::Arc::new(plan),
                            Err(e) => panic!("cannot pack {}: {}", stringify!($name), e),
                        }
                    })
                }

                /// The all-zero state.
                $vis fn initial() -> Self {
                    Self($crate::PackedState::initial(::std::sync::Arc::clone(Self::layout())))
                }

                /// Validates a raw word and wraps it.
                $vis fn from_raw(value: u64) -> $crate::StateResult<Self> {
                    $crate::PackedState::new(::std::sync::Arc::clone(Self::layout()), value).map(Self)
                }

                /// The raw packed word.
                $vis fn value(&self) -> u64 {
                    self.0.value()
                }

                $vis fn into_state(self) -> $crate::PackedState {
                    self.0
                }

                $(
                    $(#[$fmeta])*
                    $vis fn $field(&self) -> $ty {
                        <$ty as $crate::FieldType>::from_field_value(
                            self.0.value_at([<__ $name Field>]::$field as usize),
                        )
                    }

                    #[doc = concat!("Returns a state with `", stringify!($field), "` set to `value`.")]
                    $vis fn [<with_ $field>](&self, value: $ty) -> $crate::StateResult<Self> {
                        self.0
                            .with_at(
                                [<__ $name Field>]::$field as usize,
                                $crate::FieldType::into_field_value(value),
                            )
                            .map(Self)
                    }
                )*
            }

            impl ::std::default::Default for $name {
                fn default() -> Self {
                    Self::initial()
                }
            }

            impl ::std::fmt::Display for $name {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    ::std::fmt::Display::fmt(&self.0, f)
                }
            }

            impl ::std::fmt::Debug for $name {
                fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                    ::std::fmt::Display::fmt(&self.0, f)
                }
            }

            impl $crate::StateType for $name {
                fn layout() -> &'static ::std::sync::Arc<$crate::BitLayoutPlan> {
                    $name::layout()
                }

                fn as_state(&self) -> &$crate::PackedState {
                    &self.0
                }

                fn from_state(state: $crate::PackedState) -> $crate::StateResult<Self> {
                    state.expect_layout($name::layout())?;
                    Ok(Self(state))
                }

                fn from_state_unchecked(state: $crate::PackedState) -> Self {
                    Self(state)
                }
            }

            impl ::std::convert::TryFrom<$crate::PackedState> for $name {
                type Error = $crate::StateError;

                fn try_from(state: $crate::PackedState) -> $crate::StateResult<Self> {
                    <Self as $crate::StateType>::from_state(state)
                }
            }

            impl ::std::convert::From<$name> for $crate::PackedState {
                fn from(state: $name) -> Self {
                    state.0
                }
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __change_support {
    () => {
        false
    };
    (change_support) => {
        true
    };
}
