use syn::{Field, FieldsNamed, Token, Type, punctuated::Punctuated};

fn is_named(field: &Field, name: &str) -> bool {
    field.ident.as_ref().map(|i| i == name).unwrap_or(false)
}

/// 查找具名字段的类型
pub(crate) fn field_type<'a>(fields_named: &'a FieldsNamed, name: &str) -> Option<&'a Type> {
    fields_named
        .named
        .iter()
        .find(|f| is_named(f, name))
        .map(|f| &f.ty)
}

/// 确保具名字段结构体包含所需字段，并按给定顺序置于最前；
/// 已存在的字段复用原定义（保留属性与可见性），缺失的以 `pub` 新建
pub(crate) fn ensure_leading_fields(fields_named: &mut FieldsNamed, required: &[(&str, &Type)]) {
    let old_named = std::mem::take(&mut fields_named.named);
    let mut new_named: Punctuated<Field, Token![,]> = Punctuated::new();

    for (name, ty) in required.iter() {
        match old_named.iter().find(|f| is_named(f, name)) {
            Some(existing) => new_named.push(existing.clone()),
            None => {
                let ident = syn::Ident::new(name, proc_macro2::Span::call_site());
                let field: Field = syn::parse_quote! { pub #ident: #ty };
                new_named.push(field);
            }
        }
    }

    for f in old_named.into_iter() {
        if !required.iter().any(|(name, _)| is_named(&f, name)) {
            new_named.push(f);
        }
    }

    fields_named.named = new_named;
}
