pub mod document;
pub mod overrides;
pub mod parameter;

pub mod ids {
    use std::fmt;

    use serde::{Deserialize, Serialize};

    /// 宿主文档中的元素编号，与宿主 API 一样允许负数（内建类别、内建参数）。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
    pub struct ElementId(i64);

    impl ElementId {
        /// 宿主约定的“无效编号”。
        pub const INVALID: ElementId = ElementId(-1);

        #[inline]
        pub fn new(raw: i64) -> Self {
            Self(raw)
        }

        /// 提供原始数值，便于序列化或日志输出。
        #[inline]
        pub fn get(self) -> i64 {
            self.0
        }

        #[inline]
        pub fn is_invalid(self) -> bool {
            self.0 == Self::INVALID.0
        }
    }

    impl Default for ElementId {
        fn default() -> Self {
            Self::INVALID
        }
    }

    impl fmt::Display for ElementId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }
}

pub mod color {
    use serde::{Deserialize, Serialize};

    /// 8 位 RGB 颜色。宿主中“无效颜色”以 `Option<Color>::None` 表达。
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Color {
        pub red: u8,
        pub green: u8,
        pub blue: u8,
    }

    impl Color {
        #[inline]
        pub const fn new(red: u8, green: u8, blue: u8) -> Self {
            Self { red, green, blue }
        }
    }
}

pub mod class_names {
    //! 宿主运行时类型的全限定名称。

    pub const ELEMENT_TYPE: &str = "DB.ElementType";
    pub const TEXT_NOTE_TYPE: &str = "DB.TextNoteType";
    pub const DIMENSION_TYPE: &str = "DB.DimensionType";
    pub const WALL_TYPE: &str = "DB.WallType";
    pub const MATERIAL: &str = "DB.Material";
    pub const VIEW: &str = "DB.View";
    pub const CATEGORY: &str = "DB.Category";
    pub const PARAMETER_ELEMENT: &str = "DB.ParameterElement";
    pub const FILL_PATTERN: &str = "DB.FillPatternElement";
    pub const LINE_PATTERN: &str = "DB.LinePatternElement";
    pub const APPEARANCE_ASSET: &str = "DB.AppearanceAssetElement";
    pub const WALL: &str = "DB.Wall";
    pub const FAMILY_INSTANCE: &str = "DB.FamilyInstance";
    pub const TEXT_NOTE: &str = "DB.TextNote";
}

pub mod enums {
    use serde::{Deserialize, Serialize};

    /// 宿主提供的封闭枚举。记录中只保存 `TYPE_NAME` 与成员名，
    /// 通过 `from_member_name` 在应用阶段还原。
    pub trait HostEnum: Sized + Copy + 'static {
        const TYPE_NAME: &'static str;

        fn members() -> &'static [Self];

        fn member_name(self) -> &'static str;

        fn from_member_name(name: &str) -> Option<Self> {
            Self::members()
                .iter()
                .copied()
                .find(|member| member.member_name() == name)
        }
    }

    macro_rules! host_enum {
        (
            $(#[$meta:meta])*
            $name:ident = $type_name:literal { $($variant:ident),+ $(,)? }
        ) => {
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
            pub enum $name {
                $($variant),+
            }

            impl HostEnum for $name {
                const TYPE_NAME: &'static str = $type_name;

                fn members() -> &'static [Self] {
                    &[$(Self::$variant),+]
                }

                fn member_name(self) -> &'static str {
                    match self {
                        $(Self::$variant => stringify!($variant)),+
                    }
                }
            }
        };
    }

    host_enum! {
        /// 参数存储类型。
        StorageType = "DB.StorageType" { Double, Integer, String, ElementId }
    }

    host_enum! {
        /// 视图详细程度，`Undefined` 表示未覆盖。
        ViewDetailLevel = "DB.ViewDetailLevel" { Undefined, Coarse, Medium, Fine }
    }

    host_enum! {
        DisplayStyle = "DB.DisplayStyle" {
            Undefined,
            Wireframe,
            HiddenLine,
            Shading,
            ShadingWithEdges,
            Realistic,
            FlatColors,
        }
    }

    host_enum! {
        /// 复合结构层的功能。
        MaterialFunctionAssignment = "DB.MaterialFunctionAssignment" {
            None,
            Structure,
            Substrate,
            Insulation,
            Finish1,
            Finish2,
            Membrane,
            StructuralDeck,
        }
    }

    host_enum! {
        DeckEmbeddingType = "DB.StructDeckEmbeddingType" { Invalid, Standalone, Bound }
    }

    impl Default for ViewDetailLevel {
        fn default() -> Self {
            ViewDetailLevel::Undefined
        }
    }

    impl Default for DisplayStyle {
        fn default() -> Self {
            DisplayStyle::Undefined
        }
    }

}

pub mod errors {
    use thiserror::Error;

    use crate::enums::StorageType;
    use crate::ids::ElementId;

    /// 宿主文档拒绝操作时返回的错误。
    #[derive(Debug, Error)]
    pub enum HostError {
        #[error("document is not modifiable outside of a transaction")]
        NotModifiable,
        #[error("transaction `{0}` is already open")]
        TransactionAlreadyOpen(String),
        #[error("no transaction is open")]
        NoOpenTransaction,
        #[error("element with id {0} not found")]
        ElementNotFound(ElementId),
        #[error("parameter `{0}` is read-only")]
        ReadOnlyParameter(String),
        #[error("parameter `{parameter}` stores {expected:?}, got {found:?}")]
        StorageMismatch {
            parameter: String,
            expected: StorageType,
            found: StorageType,
        },
        #[error("an element of class {class_name} named `{name}` already exists")]
        DuplicateName { class_name: String, name: String },
        #[error("transaction commit rejected: {0}")]
        CommitRejected(String),
        #[error("element {0} is pinned")]
        ElementPinned(ElementId),
        #[error("invalid operation: {0}")]
        InvalidOperation(String),
    }
}
