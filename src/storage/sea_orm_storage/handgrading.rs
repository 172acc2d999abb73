//! 人工评分存储操作

use super::SeaOrmStorage;
use crate::entity::annotations::{
    ActiveModel as AnnotationActiveModel, Column as AnnotationColumn, Entity as Annotations,
};
use crate::entity::applied_annotations::{
    ActiveModel as AppliedAnnotationActiveModel, Column as AppliedAnnotationColumn,
    Entity as AppliedAnnotations,
};
use crate::entity::comments::{
    ActiveModel as CommentActiveModel, Column as CommentColumn, Entity as Comments,
};
use crate::entity::criteria::{
    ActiveModel as CriterionActiveModel, Column as CriterionColumn, Entity as Criteria,
};
use crate::entity::criterion_results::{
    ActiveModel as CriterionResultActiveModel, Column as CriterionResultColumn,
    Entity as CriterionResults,
};
use crate::entity::handgrading_results::{
    ActiveModel as ResultActiveModel, Column as ResultColumn, Entity as HandgradingResults,
    Model as ResultModel,
};
use crate::entity::handgrading_rubrics::{
    ActiveModel as RubricActiveModel, Column as RubricColumn, Entity as HandgradingRubrics,
    Model as RubricModel,
};
use crate::errors::{HWSystemError, Result};
use crate::models::handgrading::{
    entities::{
        AppliedAnnotation, Annotation, Comment, Criterion, CriterionResult, HandgradingResult,
        HandgradingRubric,
    },
    requests::{
        ApplyAnnotationRequest, CreateAnnotationRequest, CreateCommentRequest,
        CreateCriterionRequest, CreateHandgradingResultRequest, CreateRubricRequest,
        UpdateAnnotationRequest, UpdateCommentRequest, UpdateCriterionRequest,
        UpdateHandgradingResultRequest, UpdateRubricRequest,
    },
};
use std::collections::HashSet;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};

impl SeaOrmStorage {
    /// 创建评分细则
    pub async fn create_rubric_impl(&self, req: CreateRubricRequest) -> Result<HandgradingRubric> {
        let now = chrono::Utc::now().timestamp();

        let model = RubricActiveModel {
            project_id: Set(req.project_id),
            points_style: Set(req.points_style.to_string()),
            max_points: Set(req.max_points),
            show_grades_and_rubric_to_students: Set(req.show_grades_and_rubric_to_students),
            show_only_applied_rubric_to_students: Set(req.show_only_applied_rubric_to_students),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("创建评分细则失败: {e}")))?;

        result.into_rubric(Vec::new(), Vec::new())
    }

    /// 通过 ID 获取评分细则
    pub async fn get_rubric_by_id_impl(&self, rubric_id: i64) -> Result<Option<HandgradingRubric>> {
        let result = HandgradingRubrics::find_by_id(rubric_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询评分细则失败: {e}")))?;

        match result {
            Some(model) => Ok(Some(self.load_rubric(model).await?)),
            None => Ok(None),
        }
    }

    /// 通过项目 ID 获取评分细则
    pub async fn get_rubric_by_project_impl(
        &self,
        project_id: i64,
    ) -> Result<Option<HandgradingRubric>> {
        let result = HandgradingRubrics::find()
            .filter(RubricColumn::ProjectId.eq(project_id))
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询评分细则失败: {e}")))?;

        match result {
            Some(model) => Ok(Some(self.load_rubric(model).await?)),
            None => Ok(None),
        }
    }

    /// 更新评分细则
    pub async fn update_rubric_impl(
        &self,
        rubric_id: i64,
        update: UpdateRubricRequest,
    ) -> Result<Option<HandgradingRubric>> {
        let existing = self.get_rubric_by_id_impl(rubric_id).await?;
        if existing.is_none() {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();

        let mut model = RubricActiveModel {
            id: Set(rubric_id),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Some(points_style) = update.points_style {
            model.points_style = Set(points_style.to_string());
        }

        if let Some(max_points) = update.max_points {
            model.max_points = Set(max_points);
        }

        if let Some(show) = update.show_grades_and_rubric_to_students {
            model.show_grades_and_rubric_to_students = Set(show);
        }

        if let Some(show) = update.show_only_applied_rubric_to_students {
            model.show_only_applied_rubric_to_students = Set(show);
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("更新评分细则失败: {e}")))?;

        self.get_rubric_by_id_impl(rubric_id).await
    }

    /// 添加评分项
    pub async fn create_criterion_impl(
        &self,
        rubric_id: i64,
        req: CreateCriterionRequest,
    ) -> Result<Criterion> {
        let now = chrono::Utc::now().timestamp();
        let txn = self.db.begin().await?;

        let sort_order = Criteria::find()
            .filter(CriterionColumn::RubricId.eq(rubric_id))
            .count(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("统计评分项失败: {e}")))?;

        let criterion = CriterionActiveModel {
            rubric_id: Set(rubric_id),
            short_description: Set(req.short_description),
            long_description: Set(req.long_description),
            points: Set(req.points),
            sort_order: Set(sort_order as i32),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| HWSystemError::database_operation(format!("创建评分项失败: {e}")))?;

        // 已有的评分结果补齐一条未选中的评分项结果
        let results = HandgradingResults::find()
            .filter(ResultColumn::RubricId.eq(rubric_id))
            .all(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询评分结果失败: {e}")))?;

        for result in results {
            insert_criterion_result(&txn, result.id, criterion.id).await?;
        }

        txn.commit().await?;

        Ok(criterion.into_criterion())
    }

    /// 添加批注
    pub async fn create_annotation_impl(
        &self,
        rubric_id: i64,
        req: CreateAnnotationRequest,
    ) -> Result<Annotation> {
        let now = chrono::Utc::now().timestamp();

        let sort_order = Annotations::find()
            .filter(AnnotationColumn::RubricId.eq(rubric_id))
            .count(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("统计批注失败: {e}")))?;

        let model = AnnotationActiveModel {
            rubric_id: Set(rubric_id),
            short_description: Set(req.short_description),
            long_description: Set(req.long_description),
            deduction: Set(req.deduction),
            max_deduction: Set(req.max_deduction),
            sort_order: Set(sort_order as i32),
            created_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("创建批注失败: {e}")))?;

        Ok(result.into_annotation())
    }

    /// 通过 ID 获取批注
    pub async fn get_annotation_by_id_impl(
        &self,
        annotation_id: i64,
    ) -> Result<Option<Annotation>> {
        let result = Annotations::find_by_id(annotation_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询批注失败: {e}")))?;

        Ok(result.map(|m| m.into_annotation()))
    }

    /// 修改评分项
    pub async fn update_criterion_impl(
        &self,
        criterion_id: i64,
        update: UpdateCriterionRequest,
    ) -> Result<Option<Criterion>> {
        let existing = Criteria::find_by_id(criterion_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询评分项失败: {e}")))?;
        if existing.is_none() {
            return Ok(None);
        }

        let mut model = CriterionActiveModel {
            id: ActiveValue::Unchanged(criterion_id),
            ..Default::default()
        };

        if let Some(short_description) = update.short_description {
            model.short_description = Set(short_description);
        }

        if let Some(long_description) = update.long_description {
            model.long_description = Set(long_description);
        }

        if let Some(points) = update.points {
            model.points = Set(points);
        }

        // 没有字段需要更新时直接返回原记录
        if !model.is_changed() {
            return Ok(existing.map(|m| m.into_criterion()));
        }

        let updated = model
            .update(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("更新评分项失败: {e}")))?;

        Ok(Some(updated.into_criterion()))
    }

    /// 删除评分项及其评分项结果
    pub async fn delete_criterion_impl(&self, criterion_id: i64) -> Result<bool> {
        let txn = self.db.begin().await?;

        CriterionResults::delete_many()
            .filter(CriterionResultColumn::CriterionId.eq(criterion_id))
            .exec(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("删除评分项结果失败: {e}")))?;

        let result = Criteria::delete_by_id(criterion_id)
            .exec(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("删除评分项失败: {e}")))?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }

    /// 修改批注
    pub async fn update_annotation_impl(
        &self,
        annotation_id: i64,
        update: UpdateAnnotationRequest,
    ) -> Result<Option<Annotation>> {
        let existing = Annotations::find_by_id(annotation_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询批注失败: {e}")))?;
        if existing.is_none() {
            return Ok(None);
        }

        let mut model = AnnotationActiveModel {
            id: ActiveValue::Unchanged(annotation_id),
            ..Default::default()
        };

        if let Some(short_description) = update.short_description {
            model.short_description = Set(short_description);
        }

        if let Some(long_description) = update.long_description {
            model.long_description = Set(long_description);
        }

        if let Some(deduction) = update.deduction {
            model.deduction = Set(deduction);
        }

        if let Some(max_deduction) = update.max_deduction {
            model.max_deduction = Set(max_deduction);
        }

        if !model.is_changed() {
            return Ok(existing.map(|m| m.into_annotation()));
        }

        let updated = model
            .update(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("更新批注失败: {e}")))?;

        Ok(Some(updated.into_annotation()))
    }

    /// 删除批注及其所有应用记录
    pub async fn delete_annotation_impl(&self, annotation_id: i64) -> Result<bool> {
        let txn = self.db.begin().await?;

        AppliedAnnotations::delete_many()
            .filter(AppliedAnnotationColumn::AnnotationId.eq(annotation_id))
            .exec(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("移除已应用批注失败: {e}")))?;

        let result = Annotations::delete_by_id(annotation_id)
            .exec(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("删除批注失败: {e}")))?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }

    /// 获取或创建小组的人工评分结果
    ///
    /// 小组已有结果时原样返回（保留原提交），只补齐缺失的评分项结果。
    /// 返回值的第二项表示是否新建。
    pub async fn create_handgrading_result_impl(
        &self,
        req: CreateHandgradingResultRequest,
    ) -> Result<(HandgradingResult, bool)> {
        let now = chrono::Utc::now().timestamp();
        let txn = self.db.begin().await?;

        let criteria = Criteria::find()
            .filter(CriterionColumn::RubricId.eq(req.rubric_id))
            .order_by_asc(CriterionColumn::SortOrder)
            .order_by_asc(CriterionColumn::Id)
            .all(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询评分项失败: {e}")))?;

        let existing = HandgradingResults::find()
            .filter(ResultColumn::GroupId.eq(req.group_id))
            .one(&txn)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询评分结果失败: {e}")))?;

        if let Some(existing) = existing {
            let seeded: HashSet<i64> = CriterionResults::find()
                .filter(CriterionResultColumn::ResultId.eq(existing.id))
                .all(&txn)
                .await
                .map_err(|e| {
                    HWSystemError::database_operation(format!("查询评分项结果失败: {e}"))
                })?
                .into_iter()
                .map(|cr| cr.criterion_id)
                .collect();

            for criterion in criteria.iter().filter(|c| !seeded.contains(&c.id)) {
                insert_criterion_result(&txn, existing.id, criterion.id).await?;
            }

            txn.commit().await?;
            let result = self.load_result(existing).await?;
            return Ok((result, false));
        }

        let result = ResultActiveModel {
            rubric_id: Set(req.rubric_id),
            group_id: Set(req.group_id),
            submission_id: Set(req.submission_id),
            points_adjustment: Set(0.0),
            finished_grading: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| HWSystemError::database_operation(format!("创建评分结果失败: {e}")))?;

        let mut criterion_results = Vec::with_capacity(criteria.len());
        for criterion in criteria {
            criterion_results.push(insert_criterion_result(&txn, result.id, criterion.id).await?);
        }

        txn.commit().await?;

        Ok((
            result.into_result(criterion_results, Vec::new(), Vec::new()),
            true,
        ))
    }

    /// 评分细则下的全部评分结果
    pub async fn list_handgrading_results_by_rubric_impl(
        &self,
        rubric_id: i64,
    ) -> Result<Vec<HandgradingResult>> {
        let models = HandgradingResults::find()
            .filter(ResultColumn::RubricId.eq(rubric_id))
            .order_by_asc(ResultColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询评分结果失败: {e}")))?;

        let mut results = Vec::with_capacity(models.len());
        for model in models {
            results.push(self.load_result(model).await?);
        }
        Ok(results)
    }

    /// 通过 ID 获取人工评分结果
    pub async fn get_handgrading_result_by_id_impl(
        &self,
        result_id: i64,
    ) -> Result<Option<HandgradingResult>> {
        let result = HandgradingResults::find_by_id(result_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询评分结果失败: {e}")))?;

        match result {
            Some(model) => Ok(Some(self.load_result(model).await?)),
            None => Ok(None),
        }
    }

    /// 更新分数调整和完成标记
    pub async fn update_handgrading_result_impl(
        &self,
        result_id: i64,
        update: UpdateHandgradingResultRequest,
    ) -> Result<Option<HandgradingResult>> {
        let existing = HandgradingResults::find_by_id(result_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询评分结果失败: {e}")))?;
        if existing.is_none() {
            return Ok(None);
        }

        let now = chrono::Utc::now().timestamp();

        let mut model = ResultActiveModel {
            id: Set(result_id),
            updated_at: Set(now),
            ..Default::default()
        };

        if let Some(points_adjustment) = update.points_adjustment {
            model.points_adjustment = Set(points_adjustment);
        }

        if let Some(finished_grading) = update.finished_grading {
            model.finished_grading = Set(finished_grading);
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("更新评分结果失败: {e}")))?;

        self.get_handgrading_result_by_id_impl(result_id).await
    }

    /// 选中/取消选中评分项结果
    pub async fn update_criterion_result_impl(
        &self,
        criterion_result_id: i64,
        selected: bool,
    ) -> Result<Option<CriterionResult>> {
        let existing = CriterionResults::find_by_id(criterion_result_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询评分项结果失败: {e}")))?;
        if existing.is_none() {
            return Ok(None);
        }

        let model = CriterionResultActiveModel {
            id: Set(criterion_result_id),
            selected: Set(selected),
            ..Default::default()
        };

        let updated = model
            .update(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("更新评分项结果失败: {e}")))?;

        Ok(Some(updated.into_criterion_result()))
    }

    /// 应用批注
    pub async fn create_applied_annotation_impl(
        &self,
        result_id: i64,
        req: ApplyAnnotationRequest,
    ) -> Result<AppliedAnnotation> {
        let now = chrono::Utc::now().timestamp();

        let model = AppliedAnnotationActiveModel {
            result_id: Set(result_id),
            annotation_id: Set(req.annotation_id),
            comment: Set(req.comment),
            filename: Set(req.location.filename),
            first_line: Set(req.location.first_line),
            last_line: Set(req.location.last_line),
            created_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("应用批注失败: {e}")))?;

        Ok(result.into_applied_annotation())
    }

    /// 通过 ID 获取已应用批注
    pub async fn get_applied_annotation_by_id_impl(
        &self,
        id: i64,
    ) -> Result<Option<AppliedAnnotation>> {
        let result = AppliedAnnotations::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询已应用批注失败: {e}")))?;

        Ok(result.map(|m| m.into_applied_annotation()))
    }

    /// 移除已应用批注
    pub async fn delete_applied_annotation_impl(&self, id: i64) -> Result<bool> {
        let result = AppliedAnnotations::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("移除已应用批注失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 添加评语
    pub async fn create_comment_impl(
        &self,
        result_id: i64,
        req: CreateCommentRequest,
    ) -> Result<Comment> {
        let now = chrono::Utc::now().timestamp();

        let (filename, first_line, last_line) = match req.location {
            Some(location) => (
                Some(location.filename),
                Some(location.first_line),
                Some(location.last_line),
            ),
            None => (None, None, None),
        };

        let model = CommentActiveModel {
            result_id: Set(result_id),
            text: Set(req.text),
            filename: Set(filename),
            first_line: Set(first_line),
            last_line: Set(last_line),
            created_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("添加评语失败: {e}")))?;

        Ok(result.into_comment())
    }

    /// 通过 ID 获取评语
    pub async fn get_comment_by_id_impl(&self, comment_id: i64) -> Result<Option<Comment>> {
        let result = Comments::find_by_id(comment_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询评语失败: {e}")))?;

        Ok(result.map(|m| m.into_comment()))
    }

    /// 修改评语
    pub async fn update_comment_impl(
        &self,
        comment_id: i64,
        update: UpdateCommentRequest,
    ) -> Result<Option<Comment>> {
        let existing = Comments::find_by_id(comment_id)
            .one(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询评语失败: {e}")))?;
        if existing.is_none() {
            return Ok(None);
        }

        let mut model = CommentActiveModel {
            id: ActiveValue::Unchanged(comment_id),
            ..Default::default()
        };

        if let Some(text) = update.text {
            model.text = Set(text);
        }

        if let Some(location) = update.location {
            let (filename, first_line, last_line) = match location {
                Some(location) => (
                    Some(location.filename),
                    Some(location.first_line),
                    Some(location.last_line),
                ),
                None => (None, None, None),
            };
            model.filename = Set(filename);
            model.first_line = Set(first_line);
            model.last_line = Set(last_line);
        }

        if !model.is_changed() {
            return Ok(existing.map(|m| m.into_comment()));
        }

        let updated = model
            .update(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("修改评语失败: {e}")))?;

        Ok(Some(updated.into_comment()))
    }

    /// 删除评语
    pub async fn delete_comment_impl(&self, comment_id: i64) -> Result<bool> {
        let result = Comments::delete_by_id(comment_id)
            .exec(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("删除评语失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    async fn load_rubric(&self, model: RubricModel) -> Result<HandgradingRubric> {
        let criteria = Criteria::find()
            .filter(CriterionColumn::RubricId.eq(model.id))
            .order_by_asc(CriterionColumn::SortOrder)
            .order_by_asc(CriterionColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询评分项失败: {e}")))?;

        let annotations = Annotations::find()
            .filter(AnnotationColumn::RubricId.eq(model.id))
            .order_by_asc(AnnotationColumn::SortOrder)
            .order_by_asc(AnnotationColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询批注失败: {e}")))?;

        model.into_rubric(
            criteria.into_iter().map(|m| m.into_criterion()).collect(),
            annotations.into_iter().map(|m| m.into_annotation()).collect(),
        )
    }

    async fn load_result(&self, model: ResultModel) -> Result<HandgradingResult> {
        let criterion_results = CriterionResults::find()
            .filter(CriterionResultColumn::ResultId.eq(model.id))
            .order_by_asc(CriterionResultColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询评分项结果失败: {e}")))?;

        let applied_annotations = AppliedAnnotations::find()
            .filter(AppliedAnnotationColumn::ResultId.eq(model.id))
            .order_by_asc(AppliedAnnotationColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询已应用批注失败: {e}")))?;

        let comments = Comments::find()
            .filter(CommentColumn::ResultId.eq(model.id))
            .order_by_asc(CommentColumn::Id)
            .all(&self.db)
            .await
            .map_err(|e| HWSystemError::database_operation(format!("查询评语失败: {e}")))?;

        Ok(model.into_result(
            criterion_results
                .into_iter()
                .map(|m| m.into_criterion_result())
                .collect(),
            applied_annotations
                .into_iter()
                .map(|m| m.into_applied_annotation())
                .collect(),
            comments.into_iter().map(|m| m.into_comment()).collect(),
        ))
    }
}

async fn insert_criterion_result<C: ConnectionTrait>(
    db: &C,
    result_id: i64,
    criterion_id: i64,
) -> Result<CriterionResult> {
    let model = CriterionResultActiveModel {
        result_id: Set(result_id),
        criterion_id: Set(criterion_id),
        selected: Set(false),
        ..Default::default()
    };

    let inserted = model
        .insert(db)
        .await
        .map_err(|e| HWSystemError::database_operation(format!("创建评分项结果失败: {e}")))?;

    Ok(inserted.into_criterion_result())
}
