/// 時間を記録した人。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl Participant {
    /// `First-Last`形式の名前。
    pub fn display_name(&self) -> String {
        format!("{}-{}", self.first_name, self.last_name)
    }
}

/// プロジェクトに記録された1件の作業時間。
///
/// `date`はAPIから受け取った`YYYY-MM-DD`形式の文字列のまま保持し、集計時にパースする。
#[derive(Clone, Debug)]
pub struct TimeEntry {
    pub participant: Participant,
    pub date: String,
    pub minutes: i64,
    pub billable: bool,
}

#[derive(Clone, Debug)]
pub struct Invoice {
    pub date: String,
    pub total_amount: f64,
}

/// APIから取得したプロジェクト。
#[derive(Clone, Debug)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub billable_minutes: i64,
    pub unbillable_minutes: i64,
    pub invoiced_minutes: i64,
    pub invoices: Vec<Invoice>,
}
