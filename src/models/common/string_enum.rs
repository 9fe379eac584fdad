//! 字符串枚举宏
//!
//! 数据库中的状态、角色等字段以小写字符串存储，
//! 该宏为枚举生成 serde、Display、FromStr 以及 `as_str`。

#[macro_export]
macro_rules! define_string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident => $value:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                #[serde(rename = $value)]
                $variant,
            )*
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)*
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok($name::$variant),)*
                    _ => Err(format!(
                        "Invalid {}: '{}'. Supported: {}",
                        stringify!($name),
                        s,
                        [$($value),*].join(", ")
                    )),
                }
            }
        }
    };
}
