// Cookie中的商品ID列表
// 以逗号拼接的有序、去重、限长ID集合

/// Cookie值中的分隔符
const SEPARATOR: char = ',';

/// 有序去重的商品ID集合
///
/// 超过容量时淘汰最早加入的ID。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdSet {
    ids: Vec<i32>,
    capacity: usize,
}

impl IdSet {
    /// 创建空集合
    pub fn new(capacity: usize) -> Self {
        Self {
            ids: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// 从Cookie值解析
    ///
    /// 无法解析的片段会被丢弃，重复ID只保留第一次出现的位置。
    ///
    /// # Arguments
    /// * `raw` - Cookie原始值，例如 "1,2,3"
    /// * `capacity` - 最大ID数量
    pub fn parse(raw: &str, capacity: usize) -> Self {
        let mut set = Self::new(capacity);
        raw.split(SEPARATOR)
            .filter_map(|part| part.trim().parse::<i32>().ok())
            .filter(|id| *id > 0)
            .for_each(|id| {
                set.insert(id);
            });
        set
    }

    /// 加入ID，已存在时返回false
    pub fn insert(&mut self, id: i32) -> bool {
        if self.contains(id) {
            return false;
        }

        self.ids.push(id);
        if self.ids.len() > self.capacity {
            self.ids.remove(0);
        }
        true
    }

    pub fn contains(&self, id: i32) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> &[i32] {
        &self.ids
    }

    /// 序列化为Cookie值
    pub fn to_cookie_value(&self) -> String {
        self.ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// 转换为字符串数组 (收藏接口的响应格式)
    pub fn to_strings(&self) -> Vec<String> {
        self.ids.iter().map(|id| id.to_string()).collect()
    }
}
