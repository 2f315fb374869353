use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::Serialize;

/// Content-type id 0 lists the top-level type names of every other id.
pub const ALL_TYPES: u32 = 0;

const TABLE: &[(u32, &[&str])] = &[
    (1, &["电影", "动作片", "喜剧片", "爱情片", "科幻片", "恐怖片", "剧情片", "战争片", "犯罪片", "纪录片", "动画电影", "伦理片"]),
    (2, &["连续剧", "国产剧", "香港剧", "台湾剧", "韩国剧", "日本剧", "欧美剧", "海外剧"]),
    (3, &["综艺", "大陆综艺", "日韩综艺", "港台综艺", "欧美综艺"]),
    (4, &["动漫", "动画电影", "国产动漫", "日本动漫", "欧美动漫", "海外动漫"]),
    (5, &["资讯", "公告", "头条"]),
];

static DEFAULT: Lazy<Taxonomy> = Lazy::new(Taxonomy::build);

/// Static category-name table keyed by content-type id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Taxonomy {
    types: BTreeMap<u32, Vec<String>>,
}

impl Taxonomy {
    pub fn standard() -> &'static Taxonomy {
        &DEFAULT
    }

    fn build() -> Self {
        let mut types: BTreeMap<u32, Vec<String>> = TABLE
            .iter()
            .map(|(id, names)| (*id, names.iter().map(|n| n.to_string()).collect()))
            .collect();

        // The first name of each type is the type itself
        let all = TABLE.iter().map(|(_, names)| names[0].to_string()).collect();
        types.insert(ALL_TYPES, all);

        Self { types }
    }

    pub fn names(&self, type_id: u32) -> Option<&[String]> {
        self.types.get(&type_id).map(Vec::as_slice)
    }

    /// Top-level name of a content type, e.g. 2 -> "连续剧".
    pub fn type_name(&self, type_id: u32) -> Option<&str> {
        if type_id == ALL_TYPES {
            return None;
        }
        self.names(type_id).and_then(|n| n.first()).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[String])> {
        self.types.iter().map(|(id, names)| (*id, names.as_slice()))
    }
}
