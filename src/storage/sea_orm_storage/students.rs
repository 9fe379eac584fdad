//! 学生与家长关联存储操作

use std::collections::HashMap;

use super::{SeaOrmStorage, page_params, write_error};
use crate::entity::parent_students::{
    ActiveModel as LinkActiveModel, Column as LinkColumn, Entity as ParentStudents,
};
use crate::entity::students::{ActiveModel, Column, Entity as Students};
use crate::entity::users::{Column as UserColumn, Entity as Users};
use crate::errors::{PermissionError, Result};
use crate::models::{
    PaginationInfo,
    forms::requests::DistributeFormRequest,
    students::{
        entities::{Student, StudentParent},
        requests::{CreateStudentRequest, StudentListQuery, UpdateStudentRequest},
        responses::StudentListResponse,
    },
    users::entities::UserStatus,
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set,
};

impl SeaOrmStorage {
    /// 创建学生
    pub async fn create_student_impl(
        &self,
        school_id: i64,
        req: CreateStudentRequest,
    ) -> Result<Student> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            school_id: Set(school_id),
            first_name: Set(req.first_name),
            last_name: Set(req.last_name),
            grade: Set(req.grade),
            group_name: Set(req.group_name),
            external_id: Set(req.external_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(write_error("创建学生失败"))?;

        Ok(result.into_student())
    }

    /// 通过 ID 获取学生
    pub async fn get_student_by_id_impl(&self, id: i64) -> Result<Option<Student>> {
        let result = Students::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询学生失败: {e}")))?;

        Ok(result.map(|m| m.into_student()))
    }

    /// 通过学校内的外部编号获取学生
    pub async fn get_student_by_external_id_impl(
        &self,
        school_id: i64,
        external_id: &str,
    ) -> Result<Option<Student>> {
        let result = Students::find()
            .filter(Column::SchoolId.eq(school_id))
            .filter(Column::ExternalId.eq(external_id))
            .one(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询学生失败: {e}")))?;

        Ok(result.map(|m| m.into_student()))
    }

    /// 分页列出学生
    pub async fn list_students_with_pagination_impl(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse> {
        let (page, size) = page_params(query.page, query.size);

        let mut select = Students::find();

        if let Some(school_id) = query.school_id {
            select = select.filter(Column::SchoolId.eq(school_id));
        }

        if let Some(ref grade) = query.grade {
            select = select.filter(Column::Grade.eq(grade.as_str()));
        }

        if let Some(ref group) = query.group {
            select = select.filter(Column::GroupName.eq(group.as_str()));
        }

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::FirstName.contains(&escaped))
                    .add(Column::LastName.contains(&escaped))
                    .add(Column::ExternalId.contains(&escaped)),
            );
        }

        select = select
            .order_by_asc(Column::LastName)
            .order_by_asc(Column::FirstName);

        let paginator = select.paginate(&self.db, size);
        let total = paginator
            .num_items()
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询学生总数失败: {e}")))?;

        let pages = paginator
            .num_pages()
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询学生页数失败: {e}")))?;

        let students = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询学生列表失败: {e}")))?;

        Ok(StudentListResponse {
            items: students.into_iter().map(|m| m.into_student()).collect(),
            pagination: PaginationInfo {
                page: page as i64,
                page_size: size as i64,
                total: total as i64,
                total_pages: pages as i64,
            },
        })
    }

    /// 更新学生
    pub async fn update_student_impl(
        &self,
        id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<Student>> {
        if self.get_student_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(first_name) = update.first_name {
            model.first_name = Set(first_name);
        }
        if let Some(last_name) = update.last_name {
            model.last_name = Set(last_name);
        }
        if let Some(grade) = update.grade {
            model.grade = Set(grade);
        }
        if let Some(group_name) = update.group_name {
            model.group_name = Set(Some(group_name).filter(|g| !g.is_empty()));
        }
        if let Some(external_id) = update.external_id {
            model.external_id = Set(Some(external_id).filter(|e| !e.is_empty()));
        }

        model
            .update(&self.db)
            .await
            .map_err(write_error("更新学生失败"))?;

        self.get_student_by_id_impl(id).await
    }

    /// 删除学生
    pub async fn delete_student_impl(&self, id: i64) -> Result<bool> {
        let result = Students::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("删除学生失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 解析分发目标：学校内满足任一条件的学生
    pub async fn resolve_students_impl(
        &self,
        school_id: i64,
        targets: &DistributeFormRequest,
    ) -> Result<Vec<Student>> {
        let mut select = Students::find().filter(Column::SchoolId.eq(school_id));

        if !targets.all_students {
            if targets.is_empty() {
                return Ok(Vec::new());
            }

            let mut any = Condition::any();
            if !targets.student_ids.is_empty() {
                any = any.add(Column::Id.is_in(targets.student_ids.clone()));
            }
            if !targets.grades.is_empty() {
                any = any.add(Column::Grade.is_in(targets.grades.clone()));
            }
            if !targets.groups.is_empty() {
                any = any.add(Column::GroupName.is_in(targets.groups.clone()));
            }
            select = select.filter(any);
        }

        let students = select
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询目标学生失败: {e}")))?;

        Ok(students.into_iter().map(|m| m.into_student()).collect())
    }

    /// 关联家长，已关联时返回 false
    pub async fn link_parent_impl(
        &self,
        parent_id: i64,
        student_id: i64,
        relationship: Option<String>,
    ) -> Result<bool> {
        let model = LinkActiveModel {
            parent_id: Set(parent_id),
            student_id: Set(student_id),
            relationship: Set(relationship),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        match model.insert(&self.db).await.map_err(write_error("关联家长失败")) {
            Ok(_) => Ok(true),
            Err(e) if e.is_conflict() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// 取消关联
    pub async fn unlink_parent_impl(&self, parent_id: i64, student_id: i64) -> Result<bool> {
        let result = ParentStudents::delete_many()
            .filter(LinkColumn::ParentId.eq(parent_id))
            .filter(LinkColumn::StudentId.eq(student_id))
            .exec(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("取消关联失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 学生的家长列表
    pub async fn list_student_parents_impl(&self, student_id: i64) -> Result<Vec<StudentParent>> {
        Ok(self
            .list_parents_for_students_impl(&[student_id])
            .await?
            .into_iter()
            .map(|(_, parent)| parent)
            .collect())
    }

    /// 批量查询学生的活跃家长
    pub async fn list_parents_for_students_impl(
        &self,
        student_ids: &[i64],
    ) -> Result<Vec<(i64, StudentParent)>> {
        if student_ids.is_empty() {
            return Ok(Vec::new());
        }

        let links = ParentStudents::find()
            .filter(LinkColumn::StudentId.is_in(student_ids.to_vec()))
            .order_by_asc(LinkColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询家长关联失败: {e}")))?;

        if links.is_empty() {
            return Ok(Vec::new());
        }

        let parent_ids: Vec<i64> = links.iter().map(|l| l.parent_id).collect();
        let parents: HashMap<i64, _> = Users::find()
            .filter(UserColumn::Id.is_in(parent_ids))
            .filter(UserColumn::Status.eq(UserStatus::Active.to_string()))
            .all(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询家长失败: {e}")))?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(links
            .into_iter()
            .filter_map(|link| {
                parents.get(&link.parent_id).map(|user| {
                    (
                        link.student_id,
                        StudentParent {
                            parent_id: user.id,
                            email: user.email.clone(),
                            display_name: user.display_name.clone(),
                            relationship: link.relationship,
                        },
                    )
                })
            })
            .collect())
    }

    /// 家长关联的学生 ID
    pub async fn list_parent_student_ids_impl(&self, parent_id: i64) -> Result<Vec<i64>> {
        let links = ParentStudents::find()
            .filter(LinkColumn::ParentId.eq(parent_id))
            .all(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询家长关联失败: {e}")))?;

        Ok(links.into_iter().map(|l| l.student_id).collect())
    }

    /// 是否为学生的家长
    pub async fn is_parent_of_impl(&self, parent_id: i64, student_id: i64) -> Result<bool> {
        let count = ParentStudents::find()
            .filter(LinkColumn::ParentId.eq(parent_id))
            .filter(LinkColumn::StudentId.eq(student_id))
            .count(&self.db)
            .await
            .map_err(|e| PermissionError::database_operation(format!("查询家长关联失败: {e}")))?;

        Ok(count > 0)
    }
}
