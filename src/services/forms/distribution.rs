//! 分发与提醒的收件人规划
//!
//! 每个家长在同一张表单上只收到一封邮件，邮件里列出其名下的所有学生。

use std::collections::{BTreeMap, HashSet};

use crate::models::students::entities::{Student, StudentParent};

/// 一个需要通知的 (家长, 提交) 组合
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub parent_id: i64,
    pub email: String,
    pub name: String,
    pub submission_id: i64,
    pub student_name: String,
}

/// 合并后发给一个家长的通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentNotice {
    pub parent_id: i64,
    pub email: String,
    pub name: String,
    pub students: Vec<String>,
    pub submission_ids: Vec<i64>,
}

/// 按家长合并，家长按 ID 排序，同一提交只出现一次
pub fn group_by_parent<I>(recipients: I) -> Vec<ParentNotice>
where
    I: IntoIterator<Item = Recipient>,
{
    let mut grouped: BTreeMap<i64, ParentNotice> = BTreeMap::new();
    for r in recipients {
        let notice = grouped.entry(r.parent_id).or_insert_with(|| ParentNotice {
            parent_id: r.parent_id,
            email: r.email.clone(),
            name: r.name.clone(),
            students: Vec::new(),
            submission_ids: Vec::new(),
        });
        if !notice.submission_ids.contains(&r.submission_id) {
            notice.submission_ids.push(r.submission_id);
            notice.students.push(r.student_name);
        }
    }
    grouped.into_values().collect()
}

/// 新建提交对应的收件人
///
/// `created` 为 (提交 ID, 学生)，`parents` 为 (学生 ID, 家长)。
pub fn distribution_recipients(
    created: &[(i64, Student)],
    parents: &[(i64, StudentParent)],
) -> Vec<Recipient> {
    let mut recipients = Vec::new();
    for (submission_id, student) in created {
        for (_, parent) in parents.iter().filter(|(sid, _)| *sid == student.id) {
            recipients.push(Recipient {
                parent_id: parent.parent_id,
                email: parent.email.clone(),
                name: parent.display_name.clone(),
                submission_id: *submission_id,
                student_name: student.full_name(),
            });
        }
    }
    recipients
}

/// 请求中指定但未解析到本校学生的 ID
pub fn ignored_student_ids(requested: &[i64], resolved: &[Student]) -> Vec<i64> {
    let found: HashSet<i64> = resolved.iter().map(|s| s.id).collect();
    let mut seen = HashSet::new();
    requested
        .iter()
        .copied()
        .filter(|id| !found.contains(id) && seen.insert(*id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn student(id: i64, first: &str) -> Student {
        let now = Utc::now();
        Student {
            id,
            school_id: 1,
            first_name: first.to_string(),
            last_name: "Kim".to_string(),
            grade: "3".to_string(),
            group_name: None,
            external_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn parent(id: i64) -> StudentParent {
        StudentParent {
            parent_id: id,
            email: format!("parent{id}@example.com"),
            display_name: format!("Parent {id}"),
            relationship: None,
        }
    }

    #[test]
    fn test_siblings_share_one_email() {
        let created = vec![(100, student(1, "Ana")), (101, student(2, "Ben"))];
        let parents = vec![(1, parent(50)), (2, parent(50)), (2, parent(51))];

        let notices = group_by_parent(distribution_recipients(&created, &parents));
        assert_eq!(notices.len(), 2);

        assert_eq!(notices[0].parent_id, 50);
        assert_eq!(notices[0].students, vec!["Ana Kim", "Ben Kim"]);
        assert_eq!(notices[0].submission_ids, vec![100, 101]);

        assert_eq!(notices[1].parent_id, 51);
        assert_eq!(notices[1].students, vec!["Ben Kim"]);
    }

    #[test]
    fn test_students_without_parents_produce_no_mail() {
        let created = vec![(100, student(1, "Ana"))];
        assert!(distribution_recipients(&created, &[]).is_empty());
    }

    #[test]
    fn test_duplicate_recipient_rows_collapse() {
        let r = Recipient {
            parent_id: 9,
            email: "p@example.com".to_string(),
            name: "P".to_string(),
            submission_id: 5,
            student_name: "Cara Diaz".to_string(),
        };
        let notices = group_by_parent(vec![r.clone(), r]);
        assert_eq!(notices[0].students.len(), 1);
    }

    #[test]
    fn test_ignored_ids_excludes_resolved_and_duplicates() {
        let resolved = vec![student(1, "Ana"), student(3, "Cy")];
        assert_eq!(ignored_student_ids(&[1, 2, 2, 3, 4], &resolved), vec![2, 4]);
    }
}
