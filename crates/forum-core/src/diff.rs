//! JSON 문서 구조 비교.
//!
//! 저장된 문서와 제안된 문서를 재귀적으로 비교하여
//! 노드별 추가/변경/삭제 목록을 생성합니다.
//!
//! 배열은 인덱스 단위로 비교합니다. 따라서 순서 변경은 `Change`로 보고되며
//! 명확한 추가(새 인덱스, 새 키)만 `Add`로 분류됩니다.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// 문서 내 경로 구성 요소.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

/// 변경 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeltaKind {
    Add,
    Change,
    Remove,
}

/// 단일 노드 변경.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delta {
    pub kind: DeltaKind,
    pub path: Vec<PathSegment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<Value>,
}

impl Delta {
    /// 점(.)으로 연결한 경로 문자열.
    pub fn dotted_path(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// 두 문서의 구조적 차이 계산.
pub fn diff(old: &Value, new: &Value) -> Vec<Delta> {
    let mut deltas = Vec::new();
    let mut path = Vec::new();
    walk(&mut path, old, new, &mut deltas);
    deltas
}

/// 모든 변경이 추가인지 확인.
pub fn is_append_only(deltas: &[Delta]) -> bool {
    deltas.iter().all(|delta| delta.kind == DeltaKind::Add)
}

fn walk(path: &mut Vec<PathSegment>, old: &Value, new: &Value, out: &mut Vec<Delta>) {
    match (old, new) {
        (Value::Object(before), Value::Object(after)) => {
            for (key, old_value) in before {
                path.push(PathSegment::Key(key.clone()));
                match after.get(key) {
                    Some(new_value) => walk(path, old_value, new_value, out),
                    None => out.push(Delta {
                        kind: DeltaKind::Remove,
                        path: path.clone(),
                        old: Some(old_value.clone()),
                        new: None,
                    }),
                }
                path.pop();
            }

            for (key, new_value) in after {
                if before.contains_key(key) {
                    continue;
                }
                path.push(PathSegment::Key(key.clone()));
                out.push(Delta {
                    kind: DeltaKind::Add,
                    path: path.clone(),
                    old: None,
                    new: Some(new_value.clone()),
                });
                path.pop();
            }
        }
        (Value::Array(before), Value::Array(after)) => {
            let common = before.len().min(after.len());

            for (index, (old_item, new_item)) in before.iter().zip(after.iter()).enumerate() {
                path.push(PathSegment::Index(index));
                walk(path, old_item, new_item, out);
                path.pop();
            }

            for (index, new_item) in after.iter().enumerate().skip(common) {
                path.push(PathSegment::Index(index));
                out.push(Delta {
                    kind: DeltaKind::Add,
                    path: path.clone(),
                    old: None,
                    new: Some(new_item.clone()),
                });
                path.pop();
            }

            for (index, old_item) in before.iter().enumerate().skip(common) {
                path.push(PathSegment::Index(index));
                out.push(Delta {
                    kind: DeltaKind::Remove,
                    path: path.clone(),
                    old: Some(old_item.clone()),
                    new: None,
                });
                path.pop();
            }
        }
        _ if old != new => out.push(Delta {
            kind: DeltaKind::Change,
            path: path.clone(),
            old: Some(old.clone()),
            new: Some(new.clone()),
        }),
        _ => {}
    }
}
