// 凭据迭代器 - 按字典顺序生成用户名和密码的组合
// 外层为用户名，内层为密码
#[derive(Clone, Debug)]
pub struct CredentialIterator<'a> {
    usernames: &'a [String],
    passwords: &'a [String],
    user_index: usize,
    pass_index: usize,
}

impl<'a> Iterator for CredentialIterator<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        // 任一列表为空时笛卡尔积为空
        if self.passwords.is_empty() || self.user_index >= self.usernames.len() {
            return None;
        }

        let current_user = &self.usernames[self.user_index];
        let current_pass = &self.passwords[self.pass_index];

        // 更新索引，准备下一次迭代
        self.pass_index += 1;
        if self.pass_index >= self.passwords.len() {
            self.pass_index = 0;
            self.user_index += 1;
        }

        Some((current_user.as_str(), current_pass.as_str()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.passwords.is_empty() || self.user_index >= self.usernames.len() {
            0
        } else {
            (self.usernames.len() - self.user_index) * self.passwords.len() - self.pass_index
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CredentialIterator<'_> {}

impl<'a> CredentialIterator<'a> {
    pub fn new(usernames: &'a [String], passwords: &'a [String]) -> Self {
        CredentialIterator {
            usernames,
            passwords,
            user_index: 0,
            pass_index: 0,
        }
    }
}
